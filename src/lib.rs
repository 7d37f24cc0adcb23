//! Decaf compiler middle and back end.
//!
//! Takes a parsed [`Ast`](decaf_ast::Ast), runs semantic analysis, and lowers
//! valid programs to three-address code requests.
//!
//! # Example
//!
//! ```
//! use decaf::{Compiler, TacListing};
//! use decaf::ast::{AstBuilder, Ident, TypeExpr};
//! use decaf::core::Span;
//!
//! let mut b = AstBuilder::new();
//! let body = b.block(vec![], vec![], Span::default());
//! let name = Ident::new("main", Span::point(1, 6));
//! let main = b.function(name, TypeExpr::void(), vec![], Some(body));
//! let ast = b.finish(vec![main]);
//!
//! let mut listing = TacListing::new();
//! let output = Compiler::new().compile(&ast, &mut listing).unwrap();
//! assert_eq!(output.codegen.functions, 1);
//! assert_eq!(listing.lines(), vec!["main:", "BeginFunc", "EndFunc 0"]);
//! ```

pub use decaf_ast as ast;
pub use decaf_compiler as compiler;
pub use decaf_core as core;

pub use decaf_compiler::{
    CodeGenerator, CodegenOutput, FrameConfig, Instruction, InstructionSink, LayoutTable,
    ScopeTable, TacListing, TypeTable,
};
pub use decaf_core::{CodegenError, CompileError, Diagnostics, ErrorKind, SemanticError};

use decaf_ast::Ast;
use decaf_compiler::{InheritanceResolver, LayoutBuilder, SemanticChecker, SymbolBuilder};

/// Pipeline switches.
#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Run code generation even when analysis reported diagnostics.
    pub emit_on_errors: bool,
    /// Target frame conventions.
    pub frame: FrameConfig,
}

/// Everything semantic analysis produces for one program.
#[derive(Debug)]
pub struct Analysis {
    pub scopes: ScopeTable,
    pub types: TypeTable,
    pub layouts: LayoutTable,
    pub diagnostics: Diagnostics,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// Result of a successful compile.
#[derive(Debug)]
pub struct CompileOutput {
    pub codegen: CodegenOutput,
    /// Diagnostics tolerated under `emit_on_errors`.
    pub diagnostics: Diagnostics,
}

/// The compiler entry point.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Run the analysis passes and build class layouts.
    #[cfg_attr(feature = "profiling", profiling::function)]
    #[tracing::instrument(level = "debug", skip_all, fields(decls = ast.decl_count()))]
    pub fn analyze(&self, ast: &Ast) -> Analysis {
        let mut diagnostics = Diagnostics::new();

        let symbols = SymbolBuilder::new(ast).run();
        let mut scopes = symbols.scopes;
        let inheritance =
            InheritanceResolver::new(ast, &mut scopes, &symbols.inheritables, &mut diagnostics)
                .run();
        SemanticChecker::new(ast, &scopes, &mut diagnostics).run();
        let layouts = LayoutBuilder::new(ast, &scopes, &mut diagnostics)
            .with_config(self.options.frame)
            .run();

        tracing::debug!(errors = diagnostics.error_count(), "analysis complete");

        Analysis {
            scopes,
            types: inheritance.types,
            layouts,
            diagnostics,
        }
    }

    /// Analyze `ast` and, when it is clean, generate code into `sink`.
    ///
    /// Any diagnostic suppresses generation and comes back as
    /// [`CompileError::Semantic`] unless `emit_on_errors` is set.
    pub fn compile(
        &self,
        ast: &Ast,
        sink: &mut dyn InstructionSink,
    ) -> Result<CompileOutput, CompileError> {
        let analysis = self.analyze(ast);
        if analysis.has_errors() && !self.options.emit_on_errors {
            return Err(CompileError::semantic(analysis.diagnostics.into_vec()));
        }

        let codegen = CodeGenerator::new(ast, &analysis.layouts)
            .with_config(self.options.frame)
            .generate(sink)?;

        Ok(CompileOutput {
            codegen,
            diagnostics: analysis.diagnostics,
        })
    }
}

//! Error types for the Decaf middle and back end.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CompileError (top-level wrapper)
//! ├── SemanticError - collected into Diagnostics, never thrown
//! └── CodegenError  - aborts code generation immediately
//! ```
//!
//! Semantic errors describe user mistakes and are gathered so one run
//! surfaces every independent problem. Code generation errors are either the
//! late `NoMainFound` check or internal invariant violations on a program
//! that should have been rejected earlier.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Semantic Errors
// ============================================================================

/// What kind of declaration a failed type lookup was searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookingFor {
    /// A class (superclass reference or named type).
    Class,
    /// An interface (`implements` list entry).
    Interface,
}

impl LookingFor {
    /// Human-readable name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            LookingFor::Class => "class",
            LookingFor::Interface => "interface",
        }
    }
}

impl std::fmt::Display for LookingFor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A violation found during scope construction, inheritance resolution,
/// semantic checking, or layout construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    /// Two declarations share a name in one scope. The later one is reported.
    #[error("at {span}: declaration of '{name}' conflicts with declaration at {previous}")]
    DeclConflict {
        /// The conflicting name.
        name: String,
        /// Location of the later (reported) declaration.
        span: Span,
        /// Location of the earlier declaration that wins.
        previous: Span,
    },

    /// A named type reference did not resolve.
    #[error("at {span}: identifier '{name}' not declared, expected {expected}")]
    IdentifierNotDeclared {
        /// The unresolved name.
        name: String,
        /// What the lookup required.
        expected: LookingFor,
        /// Where the name was referenced.
        span: Span,
    },

    /// `this` appeared outside any class body.
    #[error("at {span}: 'this' used outside class scope")]
    ThisOutsideClassScope {
        /// Location of the `this` expression.
        span: Span,
    },

    /// A method's signature differs from an inherited or implemented member.
    #[error("at {span}: method '{class}.{name}' must match inherited type signature")]
    OverrideMismatch {
        /// Class declaring the offending method.
        class: String,
        /// Method name.
        name: String,
        /// Location of the offending method.
        span: Span,
    },

    /// A class inherits from itself, directly or through other classes.
    #[error("at {span}: class '{name}' has a cyclic inheritance chain")]
    CyclicInheritance {
        /// Class at which the cycle was detected.
        name: String,
        /// Location of that class's declaration.
        span: Span,
    },
}

/// Discriminant-only view of [`SemanticError`] and [`CodegenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DeclConflict,
    IdentifierNotDeclared,
    ThisOutsideClassScope,
    OverrideMismatch,
    CyclicInheritance,
    NoMainFound,
    UnsupportedPrintType,
    Internal,
}

impl SemanticError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            SemanticError::DeclConflict { span, .. } => *span,
            SemanticError::IdentifierNotDeclared { span, .. } => *span,
            SemanticError::ThisOutsideClassScope { span } => *span,
            SemanticError::OverrideMismatch { span, .. } => *span,
            SemanticError::CyclicInheritance { span, .. } => *span,
        }
    }

    /// Get the kind tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SemanticError::DeclConflict { .. } => ErrorKind::DeclConflict,
            SemanticError::IdentifierNotDeclared { .. } => ErrorKind::IdentifierNotDeclared,
            SemanticError::ThisOutsideClassScope { .. } => ErrorKind::ThisOutsideClassScope,
            SemanticError::OverrideMismatch { .. } => ErrorKind::OverrideMismatch,
            SemanticError::CyclicInheritance { .. } => ErrorKind::CyclicInheritance,
        }
    }
}

// ============================================================================
// Code Generation Errors
// ============================================================================

/// Errors that abort code generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// The program has no zero-argument global function named `main`.
    #[error("linker: function 'main' not defined")]
    NoMainFound,

    /// A print argument carried a type tag with no print built-in.
    #[error("internal error: cannot print value of type '{tag}'")]
    UnsupportedPrintType {
        /// The offending runtime type tag.
        tag: String,
    },

    /// A class name had no layout.
    #[error("internal error: no layout for class '{name}'")]
    UnknownClass {
        /// The class name.
        name: String,
    },

    /// A field or method was missing from the receiver's layout.
    #[error("internal error: '{class}' has no member '{member}'")]
    UnknownMember {
        /// Receiver class.
        class: String,
        /// Requested member.
        member: String,
    },

    /// An identifier matched no local, field, or global binding.
    #[error("internal error: '{name}' is not bound at this point")]
    UnboundName {
        /// The identifier.
        name: String,
    },

    /// A void call was used where a value is required.
    #[error("internal error: void result of '{name}' used as a value")]
    VoidValue {
        /// Called function.
        name: String,
    },

    /// `break` appeared outside a loop.
    #[error("internal error: break outside of a loop")]
    BreakOutsideLoop,
}

impl CodegenError {
    /// Get the kind tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodegenError::NoMainFound => ErrorKind::NoMainFound,
            CodegenError::UnsupportedPrintType { .. } => ErrorKind::UnsupportedPrintType,
            _ => ErrorKind::Internal,
        }
    }
}

// ============================================================================
// Unified Error
// ============================================================================

/// Top-level error returned by the compiler facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Semantic analysis reported one or more diagnostics.
    #[error("{count} semantic error(s); code generation skipped")]
    Semantic {
        /// Every collected diagnostic.
        errors: Vec<SemanticError>,
        /// Number of diagnostics.
        count: usize,
    },

    /// Code generation aborted.
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    /// Wrap a batch of semantic diagnostics.
    pub fn semantic(errors: Vec<SemanticError>) -> Self {
        let count = errors.len();
        CompileError::Semantic { errors, count }
    }
}

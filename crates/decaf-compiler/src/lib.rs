//! Decaf Compiler
//!
//! Semantic analysis and three-address code generation for Decaf programs.
//!
//! ## Architecture
//!
//! - **Pass 1 (Symbols)**: Build the scope tree and enter every declaration
//! - **Pass 2 (Inheritance)**: Resolve `extends`/`implements` and link class scopes
//! - **Pass 3 (Check)**: Report redeclarations, unknown types, misplaced `this`,
//!   and override mismatches
//! - **Layout**: Field offsets and vtables per class, labels for functions
//! - **Codegen**: Lower function and method bodies to TAC requests
//!
//! ## Modules
//!
//! - [`codegen`]: Expression and statement lowering
//! - [`config`]: Frame and object size conventions
//! - [`emit`]: Instruction vocabulary, sinks, and the TAC emitter
//! - [`layout`]: Class layouts and the global function table
//! - [`passes`]: The three analysis passes
//! - [`scope`]: Scope tree and symbol lookup
//! - [`type_tag`]: Runtime type tags carried by generated values

pub mod codegen;
pub mod config;
pub mod emit;
pub mod layout;
pub mod passes;
pub mod scope;
pub mod type_tag;

pub use codegen::{CodeGenerator, CodegenOutput, FrameScope, Value};
pub use config::FrameConfig;
pub use emit::{Instruction, InstructionSink, TacEmitter, TacListing};
pub use layout::{ClassLayout, FunctionInfo, GlobalLayout, LayoutBuilder, LayoutTable};
pub use passes::{
    CheckOutput, Inheritable, InheritanceOutput, InheritanceResolver, NamedType,
    SemanticChecker, SymbolBuilder, SymbolOutput, TypeTable,
};
pub use scope::{DeclKinds, Scope, ScopeTable};
pub use type_tag::TypeTag;

// Re-export the error types from core for convenience
pub use decaf_core::{CodegenError, Diagnostics, SemanticError};

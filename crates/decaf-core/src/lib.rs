//! Shared foundation types for the Decaf compiler crates.
//!
//! - [`Span`]: source ranges attached to declarations and expressions
//! - [`DeclId`], [`StmtId`], [`ExprId`], [`ScopeId`]: typed arena handles
//! - [`SemanticError`], [`CodegenError`], [`CompileError`]: error hierarchy
//! - [`Diagnostics`]: the push-only sink analysis passes report into

mod diagnostics;
mod error;
mod ids;
mod span;

pub use diagnostics::Diagnostics;
pub use error::{CodegenError, CompileError, ErrorKind, LookingFor, SemanticError};
pub use ids::{DeclId, ExprId, ScopeId, StmtId};
pub use span::Span;

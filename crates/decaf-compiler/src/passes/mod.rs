//! Analysis passes.
//!
//! - [`symbols`]: Pass 1 - build the scope tree and enter every declaration
//! - [`inheritance`]: Pass 2 - resolve `extends`/`implements` and link class scopes
//! - [`check`]: Pass 3 - redeclaration, type existence, `this` scoping, overrides
//!
//! All three share one [`ScopeTable`](crate::scope::ScopeTable) and report
//! into one [`Diagnostics`](decaf_core::Diagnostics).

pub mod check;
pub mod inheritance;
pub mod symbols;

pub use check::{CheckOutput, SemanticChecker};
pub use inheritance::{InheritanceOutput, InheritanceResolver, NamedType, TypeTable};
pub use symbols::{Inheritable, SymbolBuilder, SymbolOutput};

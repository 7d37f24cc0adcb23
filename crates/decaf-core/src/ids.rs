//! Typed handles into the AST arenas and the scope table.
//!
//! Handles are plain indices. They never own what they point at, which is
//! what lets parent links and scope links form cycles without ownership
//! cycles.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(u32);

        impl $name {
            /// Create a handle from an arena index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// The underlying arena index.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self::new(index)
            }
        }
    };
}

define_id!(
    /// Identifies a declaration (variable, class, interface, function).
    DeclId,
    "decl_"
);

define_id!(
    /// Identifies a statement.
    StmtId,
    "stmt_"
);

define_id!(
    /// Identifies an expression.
    ExprId,
    "expr_"
);

define_id!(
    /// Identifies a lexical scope in the scope table.
    ScopeId,
    "scope_"
);

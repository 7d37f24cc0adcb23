//! Declared types as written in source.
//!
//! A [`TypeExpr`] is what appears in a variable, formal, return, or
//! `NewArray` position. Named types are references by name and are resolved
//! against the scope table later; nothing here knows whether `Shape` is a
//! class or an interface.

use std::fmt;

use crate::Ident;

/// The fixed primitive type set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Int,
    Double,
    Bool,
    Void,
    Null,
    String,
    /// Placeholder carried by nodes whose type could not be determined.
    Error,
}

impl PrimitiveType {
    /// Source spelling of the primitive.
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Int => "int",
            PrimitiveType::Double => "double",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Void => "void",
            PrimitiveType::Null => "null",
            PrimitiveType::String => "string",
            PrimitiveType::Error => "error",
        }
    }
}

/// A type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// One of the built-in types.
    Primitive(PrimitiveType),
    /// A class or interface referenced by name.
    Named(Ident),
    /// Array of the element type.
    Array(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn int() -> Self {
        TypeExpr::Primitive(PrimitiveType::Int)
    }

    pub fn double() -> Self {
        TypeExpr::Primitive(PrimitiveType::Double)
    }

    pub fn bool() -> Self {
        TypeExpr::Primitive(PrimitiveType::Bool)
    }

    pub fn string() -> Self {
        TypeExpr::Primitive(PrimitiveType::String)
    }

    pub fn void() -> Self {
        TypeExpr::Primitive(PrimitiveType::Void)
    }

    /// A named type reference.
    pub fn named(ident: Ident) -> Self {
        TypeExpr::Named(ident)
    }

    /// Array of `elem`.
    pub fn array_of(elem: TypeExpr) -> Self {
        TypeExpr::Array(Box::new(elem))
    }

    /// Type equivalence.
    ///
    /// Primitives are equivalent only to themselves, named types are
    /// equivalent when they spell the same name (source locations are
    /// ignored), and arrays are equivalent when their element types are.
    pub fn is_equivalent_to(&self, other: &TypeExpr) -> bool {
        match (self, other) {
            (TypeExpr::Primitive(a), TypeExpr::Primitive(b)) => a == b,
            (TypeExpr::Named(a), TypeExpr::Named(b)) => a.name == b.name,
            (TypeExpr::Array(a), TypeExpr::Array(b)) => a.is_equivalent_to(b),
            _ => false,
        }
    }

    /// The named type at the bottom of any array nesting, if there is one.
    pub fn innermost_named(&self) -> Option<&Ident> {
        match self {
            TypeExpr::Primitive(_) => None,
            TypeExpr::Named(ident) => Some(ident),
            TypeExpr::Array(elem) => elem.innermost_named(),
        }
    }

    /// Element type when this is an array.
    pub fn element(&self) -> Option<&TypeExpr> {
        match self {
            TypeExpr::Array(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeExpr::Primitive(PrimitiveType::Void))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Primitive(p) => f.write_str(p.name()),
            TypeExpr::Named(ident) => f.write_str(&ident.name),
            TypeExpr::Array(elem) => write!(f, "{}[]", elem),
        }
    }
}

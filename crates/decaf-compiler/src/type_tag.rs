//! Runtime type tags carried by generated values.
//!
//! Code generation does no type checking; it only needs enough type
//! information to pick a print built-in, route string equality, find a
//! receiver's class layout, and tag array elements.

use std::fmt;

use decaf_ast::{PrimitiveType, TypeExpr};

/// Type tag attached to a value location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Int,
    Double,
    Bool,
    String,
    Void,
    Null,
    Error,
    /// Array with its element tag.
    Array(Box<TypeTag>),
    /// Instance of the named class or interface.
    Class(String),
}

impl TypeTag {
    /// Tag for a declared type.
    pub fn from_type(ty: &TypeExpr) -> Self {
        match ty {
            TypeExpr::Primitive(p) => match p {
                PrimitiveType::Int => TypeTag::Int,
                PrimitiveType::Double => TypeTag::Double,
                PrimitiveType::Bool => TypeTag::Bool,
                PrimitiveType::String => TypeTag::String,
                PrimitiveType::Void => TypeTag::Void,
                PrimitiveType::Null => TypeTag::Null,
                PrimitiveType::Error => TypeTag::Error,
            },
            TypeExpr::Named(ident) => TypeTag::Class(ident.name.clone()),
            TypeExpr::Array(elem) => TypeTag::array_of(TypeTag::from_type(elem)),
        }
    }

    pub fn array_of(elem: TypeTag) -> Self {
        TypeTag::Array(Box::new(elem))
    }

    /// Element tag when this is an array.
    pub fn element(&self) -> Option<&TypeTag> {
        match self {
            TypeTag::Array(elem) => Some(elem),
            _ => None,
        }
    }

    /// Class name when this is an object tag.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeTag::Class(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TypeTag::String)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeTag::Void)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Int => f.write_str("int"),
            TypeTag::Double => f.write_str("double"),
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::String => f.write_str("string"),
            TypeTag::Void => f.write_str("void"),
            TypeTag::Null => f.write_str("null"),
            TypeTag::Error => f.write_str("error"),
            TypeTag::Array(_) => f.write_str("array"),
            TypeTag::Class(name) => f.write_str(name),
        }
    }
}

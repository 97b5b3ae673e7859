// Tue Jul 21 2026 - Alex

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decl::ArrayLen;

/// Index of a node in a `TypeGraph` arena. Indices are only meaningful
/// within the arena that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeIdx(u32);

impl TypeIdx {
    pub fn new(raw: usize) -> Self {
        debug_assert!(raw < u32::MAX as usize);
        Self(raw as u32)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveClass {
    Integer,
    Float,
}

/// Width/signedness tag of a primitive node. Byte widths live in the target
/// model, not here, so one graph can be laid out under different models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    Bool,
    Char,
    SignedChar,
    UnsignedChar,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
    LongDouble,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 15] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Char,
        PrimitiveKind::SignedChar,
        PrimitiveKind::UnsignedChar,
        PrimitiveKind::Short,
        PrimitiveKind::UnsignedShort,
        PrimitiveKind::Int,
        PrimitiveKind::UnsignedInt,
        PrimitiveKind::Long,
        PrimitiveKind::UnsignedLong,
        PrimitiveKind::LongLong,
        PrimitiveKind::UnsignedLongLong,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
        PrimitiveKind::LongDouble,
    ];

    /// Maps a C spelling (normalized to single spaces) to its kind.
    pub fn from_c_name(name: &str) -> Option<PrimitiveKind> {
        let kind = match name {
            "bool" | "_Bool" => PrimitiveKind::Bool,
            "char" => PrimitiveKind::Char,
            "signed char" => PrimitiveKind::SignedChar,
            "unsigned char" => PrimitiveKind::UnsignedChar,
            "short" | "short int" | "signed short" | "signed short int" => PrimitiveKind::Short,
            "unsigned short" | "unsigned short int" => PrimitiveKind::UnsignedShort,
            "int" | "signed" | "signed int" => PrimitiveKind::Int,
            "unsigned" | "unsigned int" => PrimitiveKind::UnsignedInt,
            "long" | "long int" | "signed long" | "signed long int" => PrimitiveKind::Long,
            "unsigned long" | "unsigned long int" => PrimitiveKind::UnsignedLong,
            "long long" | "long long int" | "signed long long" | "signed long long int" => {
                PrimitiveKind::LongLong
            }
            "unsigned long long" | "unsigned long long int" => PrimitiveKind::UnsignedLongLong,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            "long double" => PrimitiveKind::LongDouble,
            _ => return None,
        };
        Some(kind)
    }

    pub fn c_name(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::SignedChar => "signed char",
            PrimitiveKind::UnsignedChar => "unsigned char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::UnsignedShort => "unsigned short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::UnsignedInt => "unsigned int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::UnsignedLong => "unsigned long",
            PrimitiveKind::LongLong => "long long",
            PrimitiveKind::UnsignedLongLong => "unsigned long long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::LongDouble => "long double",
        }
    }

    pub fn class(&self) -> PrimitiveClass {
        match self {
            PrimitiveKind::Float | PrimitiveKind::Double | PrimitiveKind::LongDouble => {
                PrimitiveClass::Float
            }
            _ => PrimitiveClass::Integer,
        }
    }

    /// Plain `char` is treated as signed, matching the LP64 targets the
    /// default model describes.
    pub fn is_signed(&self) -> bool {
        !matches!(
            self,
            PrimitiveKind::Bool
                | PrimitiveKind::UnsignedChar
                | PrimitiveKind::UnsignedShort
                | PrimitiveKind::UnsignedInt
                | PrimitiveKind::UnsignedLong
                | PrimitiveKind::UnsignedLongLong
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

/// One field of a struct or union node. Position in the field list is the
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNode {
    pub name: String,
    pub ty: TypeIdx,
}

impl FieldNode {
    pub fn new(name: &str, ty: TypeIdx) -> Self {
        Self { name: name.to_string(), ty }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    Void,
    Primitive {
        prim: PrimitiveKind,
    },
    Pointer {
        pointee: TypeIdx,
    },
    Array {
        element: TypeIdx,
        count: ArrayLen,
    },
    Struct {
        fields: Vec<FieldNode>,
    },
    Union {
        fields: Vec<FieldNode>,
    },
    Enum {
        members: Vec<EnumMember>,
    },
    FunctionSignature {
        returns: TypeIdx,
        params: Vec<TypeIdx>,
        variadic: bool,
    },
    Typedef {
        target: TypeIdx,
    },
}

impl TypeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeKind::Void => "void",
            TypeKind::Primitive { .. } => "primitive",
            TypeKind::Pointer { .. } => "pointer",
            TypeKind::Array { .. } => "array",
            TypeKind::Struct { .. } => "struct",
            TypeKind::Union { .. } => "union",
            TypeKind::Enum { .. } => "enum",
            TypeKind::FunctionSignature { .. } => "function",
            TypeKind::Typedef { .. } => "typedef",
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, TypeKind::Struct { .. } | TypeKind::Union { .. })
    }

    pub fn fields(&self) -> Option<&[FieldNode]> {
        match self {
            TypeKind::Struct { fields } | TypeKind::Union { fields } => Some(fields),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl TypeNode {
    pub fn named(name: &str, kind: TypeKind) -> Self {
        Self { name: Some(name.to_string()), kind }
    }

    pub fn anon(kind: TypeKind) -> Self {
        Self { name: None, kind }
    }
}

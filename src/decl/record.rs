// Mon Jul 20 2026 - Alex

use serde::{Deserialize, Serialize};

use crate::decl::typeref::TypeRef;

/// One named field of a struct or union declaration. Position in the field
/// list is the declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEnumMember {
    pub name: String,
    /// Explicit discriminant; when absent the member takes the previous
    /// value plus one, starting at zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

/// One declaration as emitted by the front end. A feed is an ordered list of
/// these; order only matters for diagnostics, not for reference resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RawDecl {
    Struct {
        name: String,
        fields: Vec<RawField>,
    },
    Union {
        name: String,
        fields: Vec<RawField>,
    },
    Enum {
        name: String,
        members: Vec<RawEnumMember>,
    },
    Typedef {
        name: String,
        target: TypeRef,
    },
    Function {
        name: String,
        returns: TypeRef,
        #[serde(default)]
        params: Vec<TypeRef>,
        #[serde(default)]
        variadic: bool,
    },
}

impl RawDecl {
    pub fn name(&self) -> &str {
        match self {
            RawDecl::Struct { name, .. }
            | RawDecl::Union { name, .. }
            | RawDecl::Enum { name, .. }
            | RawDecl::Typedef { name, .. }
            | RawDecl::Function { name, .. } => name,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            RawDecl::Struct { .. } => "struct",
            RawDecl::Union { .. } => "union",
            RawDecl::Enum { .. } => "enum",
            RawDecl::Typedef { .. } => "typedef",
            RawDecl::Function { .. } => "function",
        }
    }

    /// Every type reference this declaration makes, in declaration order.
    pub fn references(&self) -> Vec<&TypeRef> {
        match self {
            RawDecl::Struct { fields, .. } | RawDecl::Union { fields, .. } => {
                fields.iter().map(|f| &f.ty).collect()
            }
            RawDecl::Enum { .. } => Vec::new(),
            RawDecl::Typedef { target, .. } => vec![target],
            RawDecl::Function { returns, params, .. } => {
                std::iter::once(returns).chain(params.iter()).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decl_deserializes_from_tagged_json() {
        let json = r#"{
            "kind": "struct",
            "name": "mystruct",
            "fields": [
                {"name": "x", "type": "int"},
                {"name": "next", "type": "mystruct*"}
            ]
        }"#;
        let decl: RawDecl = serde_json::from_str(json).unwrap();
        assert_eq!(decl.name(), "mystruct");
        assert_eq!(decl.kind_name(), "struct");
        assert_eq!(decl.references().len(), 2);
    }

    #[test]
    fn test_function_defaults() {
        let json = r#"{"kind": "function", "name": "f", "returns": "void"}"#;
        let decl: RawDecl = serde_json::from_str(json).unwrap();
        match decl {
            RawDecl::Function { params, variadic, .. } => {
                assert!(params.is_empty());
                assert!(!variadic);
            }
            _ => panic!("expected function"),
        }
    }
}

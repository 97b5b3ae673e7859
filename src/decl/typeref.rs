// Mon Jul 20 2026 - Alex

use std::fmt;

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::decl::error::FeedError;

/// Element count of an array reference. Debug-info feeds may carry arrays
/// whose bound was never recovered; those stay `Unresolved` and fail layout
/// for their subtree only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayLen {
    Fixed(u64),
    Unresolved,
}

impl fmt::Display for ArrayLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayLen::Fixed(n) => write!(f, "{}", n),
            ArrayLen::Unresolved => Ok(()),
        }
    }
}

/// One pointer or array marker applied to a base type name, innermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefWrapper {
    Pointer,
    Array(ArrayLen),
}

/// A reference to a type by name, plus the pointer/array markers the front
/// end attached to it. `wrappers` reads inside-out: `char[4]*` is a pointer
/// to a 4-char array, `char*[4]` is an array of 4 pointers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub base: String,
    pub wrappers: Vec<RefWrapper>,
}

static REF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*(?:\s+[A-Za-z0-9_]+)*)\s*([*\[\]0-9\s]*)$").unwrap()
});

static MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*|\[\s*([0-9]*)\s*\]").unwrap());

impl TypeRef {
    pub fn plain(base: &str) -> Self {
        Self { base: base.to_string(), wrappers: Vec::new() }
    }

    pub fn pointer(base: &str, depth: u32) -> Self {
        Self {
            base: base.to_string(),
            wrappers: (0..depth).map(|_| RefWrapper::Pointer).collect(),
        }
    }

    pub fn array(base: &str, dims: &[u64]) -> Self {
        Self {
            base: base.to_string(),
            wrappers: dims.iter().map(|d| RefWrapper::Array(ArrayLen::Fixed(*d))).collect(),
        }
    }

    pub fn is_plain(&self) -> bool {
        self.wrappers.is_empty()
    }

    /// True when the outermost marker is a pointer, i.e. the referenced
    /// storage is pointer-sized no matter what the base resolves to.
    pub fn is_pointer(&self) -> bool {
        matches!(self.wrappers.last(), Some(RefWrapper::Pointer))
    }

    /// Parses the shorthand form, e.g. `int`, `unsigned long`, `mystruct**`,
    /// `int[10][10]`, `char[]`, `char[4]*`.
    pub fn parse(input: &str) -> Result<Self, FeedError> {
        let bad = |detail: &str| FeedError::BadTypeRef {
            input: input.to_string(),
            detail: detail.to_string(),
        };

        let caps = REF_RE.captures(input).ok_or_else(|| bad("expected a type name"))?;
        let base = caps[1].split_whitespace().join(" ");
        let suffix = &caps[2];

        let mut wrappers = Vec::new();
        let mut consumed = 0usize;
        for m in MARKER_RE.captures_iter(suffix) {
            let whole = m.get(0).unwrap();
            consumed += whole.as_str().chars().filter(|c| !c.is_whitespace()).count();
            if whole.as_str() == "*" {
                wrappers.push(RefWrapper::Pointer);
            } else {
                let digits = m.get(1).unwrap().as_str();
                if digits.is_empty() {
                    wrappers.push(RefWrapper::Array(ArrayLen::Unresolved));
                } else {
                    let count: u64 =
                        digits.parse().map_err(|_| bad("array length out of range"))?;
                    wrappers.push(RefWrapper::Array(ArrayLen::Fixed(count)));
                }
            }
        }

        let expected = suffix.chars().filter(|c| !c.is_whitespace()).count();
        if consumed != expected {
            return Err(bad("stray characters after type name"));
        }
        Ok(Self { base, wrappers })
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for w in &self.wrappers {
            match w {
                RefWrapper::Pointer => write!(f, "*")?,
                RefWrapper::Array(len) => write!(f, "[{}]", len)?,
            }
        }
        Ok(())
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Structured alternative to the shorthand string: pointer markers apply
/// outside the array dimensions, so mixed orders need the string form.
#[derive(Deserialize)]
struct StructuredRef {
    base: String,
    #[serde(default)]
    pointer_depth: u32,
    #[serde(default)]
    array_dims: Vec<u64>,
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RefVisitor;

        impl<'de> Visitor<'de> for RefVisitor {
            type Value = TypeRef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a type reference string or table")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TypeRef, E> {
                TypeRef::parse(v).map_err(E::custom)
            }

            fn visit_map<M: MapAccess<'de>>(self, map: M) -> Result<TypeRef, M::Error> {
                let s = StructuredRef::deserialize(de::value::MapAccessDeserializer::new(map))?;
                let mut wrappers: Vec<RefWrapper> = s
                    .array_dims
                    .iter()
                    .map(|d| RefWrapper::Array(ArrayLen::Fixed(*d)))
                    .collect();
                wrappers.extend((0..s.pointer_depth).map(|_| RefWrapper::Pointer));
                Ok(TypeRef { base: s.base.split_whitespace().join(" "), wrappers })
            }
        }

        deserializer.deserialize_any(RefVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_multiword() {
        let r = TypeRef::parse("int").unwrap();
        assert_eq!(r, TypeRef::plain("int"));

        let r = TypeRef::parse("unsigned   long  long").unwrap();
        assert_eq!(r.base, "unsigned long long");
        assert!(r.is_plain());
    }

    #[test]
    fn test_parse_pointers_and_arrays() {
        let r = TypeRef::parse("C**").unwrap();
        assert_eq!(r, TypeRef::pointer("C", 2));
        assert!(r.is_pointer());

        let r = TypeRef::parse("int[10][10]").unwrap();
        assert_eq!(r, TypeRef::array("int", &[10, 10]));

        let r = TypeRef::parse("char[]").unwrap();
        assert_eq!(r.wrappers, vec![RefWrapper::Array(ArrayLen::Unresolved)]);
    }

    #[test]
    fn test_parse_marker_order_is_inside_out() {
        let ptr_to_array = TypeRef::parse("char[4]*").unwrap();
        assert_eq!(
            ptr_to_array.wrappers,
            vec![RefWrapper::Array(ArrayLen::Fixed(4)), RefWrapper::Pointer]
        );

        let array_of_ptr = TypeRef::parse("char*[4]").unwrap();
        assert_eq!(
            array_of_ptr.wrappers,
            vec![RefWrapper::Pointer, RefWrapper::Array(ArrayLen::Fixed(4))]
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TypeRef::parse("").is_err());
        assert!(TypeRef::parse("9bad").is_err());
        assert!(TypeRef::parse("int[").is_err());
        assert!(TypeRef::parse("int]3[").is_err());
    }

    #[test]
    fn test_deserialize_string_or_struct() {
        let from_str: TypeRef = serde_json::from_str("\"mystruct*\"").unwrap();
        assert_eq!(from_str, TypeRef::pointer("mystruct", 1));

        let from_map: TypeRef =
            serde_json::from_str(r#"{"base": "int", "array_dims": [10, 10]}"#).unwrap();
        assert_eq!(from_map, TypeRef::array("int", &[10, 10]));
    }

    #[test]
    fn test_display_roundtrip() {
        for text in ["int", "mystruct**", "int[10][10]", "char[]", "char[4]*"] {
            let parsed = TypeRef::parse(text).unwrap();
            assert_eq!(parsed.to_string(), text);
            assert_eq!(TypeRef::parse(&parsed.to_string()).unwrap(), parsed);
        }
    }
}

// Sat Jul 25 2026 - Alex

use std::fmt;

use serde::Serialize;

use crate::equiv::path::DivergePath;

/// What aspect of the two types disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    KindTag,
    PrimitiveWidth,
    PrimitiveSignedness,
    FieldCount,
    FieldOrder,
    FieldName,
    ElementCount,
    EnumMembers,
    ParamCount,
    Variadic,
    Size,
    Alignment,
    FieldOffset,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MismatchKind::KindTag => "kind",
            MismatchKind::PrimitiveWidth => "primitive width",
            MismatchKind::PrimitiveSignedness => "primitive signedness",
            MismatchKind::FieldCount => "field count",
            MismatchKind::FieldOrder => "field order",
            MismatchKind::FieldName => "field name",
            MismatchKind::ElementCount => "element count",
            MismatchKind::EnumMembers => "enum members",
            MismatchKind::ParamCount => "parameter count",
            MismatchKind::Variadic => "variadic flag",
            MismatchKind::Size => "size",
            MismatchKind::Alignment => "alignment",
            MismatchKind::FieldOffset => "field offset",
        };
        write!(f, "{text}")
    }
}

/// One concrete disagreement, with rendered values from both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    pub path: DivergePath,
    pub kind: MismatchKind,
    pub left: String,
    pub right: String,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at {}: {} differs: left {}, right {}",
            self.path, self.kind, self.left, self.right
        )
    }
}

/// Verdict for one pair of roots. Equivalent exactly when nothing diverged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquivalenceResult {
    pub divergences: Vec<Divergence>,
}

impl EquivalenceResult {
    pub fn is_equivalent(&self) -> bool {
        self.divergences.is_empty()
    }
}

impl fmt::Display for EquivalenceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_equivalent() {
            return write!(f, "equivalent");
        }
        writeln!(f, "{} divergence(s):", self.divergences.len())?;
        for d in &self.divergences {
            writeln!(f, "  {d}")?;
        }
        Ok(())
    }
}

// Thu Jul 23 2026 - Alex

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::node::TypeIdx;
use crate::layout::alignment::Alignment;
use crate::layout::offset::Offset;
use crate::layout::size::Size;

/// Resolved placement of one field: byte offset from the start of the
/// aggregate and the field's own size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub name: String,
    pub ty: TypeIdx,
    pub offset: Offset,
    pub size: Size,
}

/// Computed layout of one type node. `fields` is empty for anything that is
/// not a struct or union; union fields all sit at offset zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub size: Size,
    pub align: Alignment,
    pub fields: Vec<FieldLayout>,
}

impl LayoutInfo {
    pub fn scalar(size: Size, align: Alignment) -> Self {
        Self { size, align, fields: Vec::new() }
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn offsets(&self) -> Vec<u64> {
        self.fields.iter().map(|f| f.offset.as_u64()).collect()
    }

    /// Padding gaps in ascending offset order, including any trailing pad.
    /// Only meaningful for structs; union members overlap and report none.
    pub fn paddings(&self) -> Vec<(Offset, u64)> {
        let mut gaps = Vec::new();
        let mut cursor = 0u64;
        for field in &self.fields {
            let start = field.offset.as_u64();
            if start > cursor {
                gaps.push((Offset::new(cursor), start - cursor));
            }
            let end = start + field.size.as_u64();
            if end > cursor {
                cursor = end;
            }
        }
        if self.size.as_u64() > cursor {
            gaps.push((Offset::new(cursor), self.size.as_u64() - cursor));
        }
        gaps
    }
}

impl fmt::Display for LayoutInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "size {} align {}", self.size, self.align)?;
        for field in &self.fields {
            write!(f, "\n  {:>4}  {} ({} bytes)", field.offset, field.name, field.size)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, offset: u64, size: u64) -> FieldLayout {
        FieldLayout {
            name: name.to_string(),
            ty: TypeIdx::new(0),
            offset: Offset::new(offset),
            size: Size::new(size),
        }
    }

    #[test]
    fn test_paddings_reports_gaps_and_tail() {
        let info = LayoutInfo {
            size: Size::new(12),
            align: Alignment::new(4),
            fields: vec![field("a", 0, 1), field("b", 4, 4), field("c", 8, 2)],
        };
        assert_eq!(
            info.paddings(),
            vec![(Offset::new(1), 3), (Offset::new(10), 2)]
        );
    }

    #[test]
    fn test_paddings_ignores_union_overlap() {
        let info = LayoutInfo {
            size: Size::new(8),
            align: Alignment::new(8),
            fields: vec![field("i", 0, 4), field("d", 0, 8)],
        };
        assert_eq!(info.paddings(), Vec::new());
    }
}

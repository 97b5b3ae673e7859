// Thu Jul 23 2026 - Alex

use serde::{Deserialize, Serialize};

use crate::graph::node::PrimitiveKind;
use crate::layout::alignment::Alignment;

/// Whether aggregates get natural padding or none at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructPacking {
    Natural,
    Packed,
}

impl Default for StructPacking {
    fn default() -> Self {
        StructPacking::Natural
    }
}

/// Primitive widths and pointer geometry of the machine the layouts are
/// computed for. Natural alignment means a primitive aligns to its own
/// size; the packed toggle flattens every alignment to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetModel {
    pub pointer_size: u64,
    pub pointer_align: u64,
    pub short_size: u64,
    pub int_size: u64,
    pub long_size: u64,
    pub long_long_size: u64,
    pub float_size: u64,
    pub double_size: u64,
    pub long_double_size: u64,
    pub enum_size: u64,
    pub struct_packing: StructPacking,
}

impl Default for TargetModel {
    fn default() -> Self {
        Self::lp64()
    }
}

impl TargetModel {
    pub fn lp64() -> Self {
        Self {
            pointer_size: 8,
            pointer_align: 8,
            short_size: 2,
            int_size: 4,
            long_size: 8,
            long_long_size: 8,
            float_size: 4,
            double_size: 8,
            long_double_size: 16,
            enum_size: 4,
            struct_packing: StructPacking::Natural,
        }
    }

    pub fn ilp32() -> Self {
        Self {
            pointer_size: 4,
            pointer_align: 4,
            long_size: 4,
            long_double_size: 8,
            ..Self::lp64()
        }
    }

    pub fn packed(mut self) -> Self {
        self.struct_packing = StructPacking::Packed;
        self
    }

    pub fn is_packed(&self) -> bool {
        self.struct_packing == StructPacking::Packed
    }

    pub fn primitive_size(&self, kind: PrimitiveKind) -> u64 {
        match kind {
            PrimitiveKind::Bool
            | PrimitiveKind::Char
            | PrimitiveKind::SignedChar
            | PrimitiveKind::UnsignedChar => 1,
            PrimitiveKind::Short | PrimitiveKind::UnsignedShort => self.short_size,
            PrimitiveKind::Int | PrimitiveKind::UnsignedInt => self.int_size,
            PrimitiveKind::Long | PrimitiveKind::UnsignedLong => self.long_size,
            PrimitiveKind::LongLong | PrimitiveKind::UnsignedLongLong => self.long_long_size,
            PrimitiveKind::Float => self.float_size,
            PrimitiveKind::Double => self.double_size,
            PrimitiveKind::LongDouble => self.long_double_size,
        }
    }

    pub fn primitive_alignment(&self, kind: PrimitiveKind) -> Alignment {
        self.alignment_for(self.primitive_size(kind))
    }

    pub fn pointer_alignment(&self) -> Alignment {
        self.alignment_for(self.pointer_align)
    }

    pub fn enum_alignment(&self) -> Alignment {
        self.alignment_for(self.enum_size)
    }

    fn alignment_for(&self, natural: u64) -> Alignment {
        match self.struct_packing {
            StructPacking::Packed => Alignment::one(),
            StructPacking::Natural => Alignment::new(natural),
        }
    }

    /// First problem with the model, or Ok. Every width must be a nonzero
    /// power of two for the natural-alignment rule to hold.
    pub fn validate(&self) -> Result<(), String> {
        let widths = [
            ("pointer_size", self.pointer_size),
            ("pointer_align", self.pointer_align),
            ("short_size", self.short_size),
            ("int_size", self.int_size),
            ("long_size", self.long_size),
            ("long_long_size", self.long_long_size),
            ("float_size", self.float_size),
            ("double_size", self.double_size),
            ("long_double_size", self.long_double_size),
            ("enum_size", self.enum_size),
        ];
        for (name, value) in widths {
            if value == 0 || !value.is_power_of_two() {
                return Err(format!("{} must be a nonzero power of two, got {}", name, value));
            }
        }
        if self.pointer_align > self.pointer_size {
            return Err(format!(
                "pointer_align {} exceeds pointer_size {}",
                self.pointer_align, self.pointer_size
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lp64_defaults() {
        let target = TargetModel::default();
        assert!(target.validate().is_ok());
        assert_eq!(target.primitive_size(PrimitiveKind::Char), 1);
        assert_eq!(target.primitive_size(PrimitiveKind::Int), 4);
        assert_eq!(target.primitive_size(PrimitiveKind::Double), 8);
        assert_eq!(target.pointer_size, 8);
        assert_eq!(target.primitive_alignment(PrimitiveKind::Int).as_u64(), 4);
    }

    #[test]
    fn test_packed_flattens_alignment() {
        let target = TargetModel::lp64().packed();
        assert_eq!(target.primitive_alignment(PrimitiveKind::Double).as_u64(), 1);
        assert_eq!(target.pointer_alignment().as_u64(), 1);
    }

    #[test]
    fn test_validate_rejects_odd_widths() {
        let mut target = TargetModel::lp64();
        target.int_size = 3;
        assert!(target.validate().is_err());
    }

    #[test]
    fn test_model_deserializes_with_defaults() {
        let target: TargetModel = serde_json::from_str(r#"{"pointer_size": 4, "pointer_align": 4}"#).unwrap();
        assert_eq!(target.pointer_size, 4);
        assert_eq!(target.int_size, 4);
        assert_eq!(target.struct_packing, StructPacking::Natural);
    }
}

// Sat Jul 25 2026 - Alex

use bitflags::bitflags;

bitflags! {
    /// Tunes how strict structural comparison is. The empty set is the
    /// loose baseline: shapes and widths must agree, names and derived
    /// layout are not consulted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompareFlags: u8 {
        /// Fields must match by name as well as by type.
        const REQUIRE_FIELD_NAMES = 1 << 0;
        /// Also compare computed size, alignment and field offsets for
        /// every aggregate pair visited.
        const CHECK_LAYOUT = 1 << 1;
    }
}

impl Default for CompareFlags {
    fn default() -> Self {
        CompareFlags::empty()
    }
}

impl CompareFlags {
    /// Everything on. What the fixture checker runs with.
    pub fn strict() -> Self {
        CompareFlags::REQUIRE_FIELD_NAMES | CompareFlags::CHECK_LAYOUT
    }
}

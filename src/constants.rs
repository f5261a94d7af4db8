//! Centralized Constants
//!
//! Single source of truth for the sizing constants shared by the ring
//! buffer and the UART bridge.

// =============================================================================
// Storage Sizes
// =============================================================================

/// Smallest storage a ring buffer accepts (one slot is reserved to tell
/// full from empty, so this leaves room for a single byte)
pub const MIN_STORAGE_LEN: usize = 2;

/// Slots a ring buffer keeps empty to distinguish full from empty
pub const RESERVED_SLOTS: usize = 1;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_storage_leaves_one_usable_byte() {
        assert_eq!(MIN_STORAGE_LEN - RESERVED_SLOTS, 1);
    }
}

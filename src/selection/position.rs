use std::ops::{Bound, Range, RangeBounds};

use crate::error::{Result, SelectionError};

/// Fails unless `index` is a position in a list of `len` entries.
pub(super) fn check(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(SelectionError::IndexOutOfRange { index, len }.into())
    }
}

/// `range` clamped to a list of `len` entries; empty if it starts past the end.
pub(super) fn clamp(range: &impl RangeBounds<usize>, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    let end = end.min(len);
    start.min(end)..end
}

/// Position popped by default: the last one, or 0 on an empty list so the
/// range check reports it.
pub(super) fn last_or_zero(len: usize) -> usize {
    len.saturating_sub(1)
}

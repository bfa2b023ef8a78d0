//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

/// Binding vectors are always sized from the same label table.
#[inline]
pub(crate) fn ensure_same_len(dst: usize, src: usize) {
    assert_eq!(
        dst, src,
        "Bindings: size mismatch ({dst} vs {src}); \
         both vectors must come from the same label table"
    );
}

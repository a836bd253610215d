//! Index ranges and the recursive halving rule.
//!
//! A [`Partition`] is a half-open range `[lo, hi)` over a source. The executor
//! keeps halving a partition with [`Partition::split`] until its size is at most
//! the leaf threshold, then hands it to the leaf folder. Halves are always
//! disjoint and together cover the parent exactly.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::ops::Range;

/// A contiguous half-open index range `[lo, hi)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Partition {
    lo: usize,
    hi: usize,
}

impl Partition {
    /// Build a partition. `hi` is clamped so that `lo <= hi` always holds.
    #[must_use]
    pub const fn new(lo: usize, hi: usize) -> Self {
        let hi = if hi < lo { lo } else { hi };
        Self { lo, hi }
    }

    /// The partition covering a whole source of `len` elements.
    #[must_use]
    pub const fn full(len: usize) -> Self {
        Self { lo: 0, hi: len }
    }

    /// First index in the range.
    #[inline]
    #[must_use]
    pub const fn lo(&self) -> usize {
        self.lo
    }

    /// One past the last index in the range.
    #[inline]
    #[must_use]
    pub const fn hi(&self) -> usize {
        self.hi
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.hi.saturating_sub(self.lo)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.hi <= self.lo
    }

    /// Whether a partition of this size is folded directly instead of split.
    #[inline]
    #[must_use]
    pub const fn is_leaf(&self, threshold: usize) -> bool {
        self.len() <= threshold
    }

    /// Split at `lo + len / 2`. The left half is never larger than the right one.
    #[must_use]
    pub const fn split(&self) -> (Self, Self) {
        let mid = self.lo + self.len() / 2;
        (Self { lo: self.lo, hi: mid }, Self { lo: mid, hi: self.hi })
    }

    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.lo..self.hi
    }
}

impl From<Range<usize>> for Partition {
    fn from(r: Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "[{}, {})", self.lo, self.hi)
    }
}

/// Number of leaves produced by recursively halving `len` elements with threshold `threshold`.
///
/// An empty source still yields one (empty) leaf. Returns `None` for a zero threshold,
/// which would never stop splitting.
#[must_use]
pub fn leaf_count(len: usize, threshold: usize) -> Option<usize> {
    fn go(len: usize, threshold: usize) -> usize {
        if len <= threshold {
            1
        } else {
            let left = len / 2;
            go(left, threshold) + go(len - left, threshold)
        }
    }
    if threshold == 0 {
        return None;
    }
    Some(go(len, threshold))
}

/// Enumerate the leaves of `part` in left-to-right order.
///
/// Returns nothing for a zero threshold.
#[must_use]
pub fn leaves(part: Partition, threshold: usize) -> Vec<Partition> {
    let mut out = Vec::new();
    if threshold == 0 {
        return out;
    }
    let mut stack = vec![part];
    while let Some(p) = stack.pop() {
        if p.is_leaf(threshold) {
            out.push(p);
        } else {
            let (l, r) = p.split();
            // right first so the left half is popped next
            stack.push(r);
            stack.push(l);
        }
    }
    out
}

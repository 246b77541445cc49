//! Canonical code-point range arithmetic backing character classes.
//!
//! A range list is canonical when it is sorted ascending, its ranges are
//! disjoint and any two neighbors are separated by at least one code point
//! that belongs to neither. All public operations take and return canonical
//! lists over the inclusive domain `[0, MAX_CODE_POINT]`.

/// The largest Unicode code point.
pub const MAX_CODE_POINT: u32 = 0x10FFFF;

/// An inclusive span of code points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodePointRange {
    pub start: u32,
    pub end: u32,
}

impl CodePointRange {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A range covering exactly one code point.
    pub const fn single(value: u32) -> Self {
        Self {
            start: value,
            end: value,
        }
    }

    pub fn contains(&self, value: u32) -> bool {
        self.start <= value && value <= self.end
    }
}

/// Returns the canonical list covering every code point the input leaves
/// uncovered.
pub fn complement(ranges: &[CodePointRange]) -> Vec<CodePointRange> {
    let mut inverted = Vec::with_capacity(ranges.len() + 1);
    let mut from = 0u32;

    for range in ranges {
        if range.start > from {
            inverted.push(CodePointRange::new(from, range.start - 1));
        }
        match range.end.checked_add(1) {
            Some(next) => from = next,
            // the input reaches u32::MAX; nothing above it is representable
            None => return inverted,
        }
    }

    if from <= MAX_CODE_POINT {
        inverted.push(CodePointRange::new(from, MAX_CODE_POINT));
    }

    inverted
}

/// Inserts a range into a canonical list, merging any ranges it touches or
/// comes within one code point of.
pub fn insert(ranges: &mut Vec<CodePointRange>, new: CodePointRange) {
    // index of the first existing range that could merge with `new`
    let lo = ranges.partition_point(|r| adjacent_end(r.end) < new.start);
    // index one past the last range that could merge with `new`
    let hi = ranges.partition_point(|r| r.start <= adjacent_end(new.end));

    if lo == hi {
        ranges.insert(lo, new);
        return;
    }

    let merged = CodePointRange::new(
        new.start.min(ranges[lo].start),
        new.end.max(ranges[hi - 1].end),
    );
    ranges.splice(lo..hi, std::iter::once(merged));
}

/// Rebuilds an arbitrary range list into canonical form.
pub fn canonicalize(ranges: &[CodePointRange]) -> Vec<CodePointRange> {
    let mut canonical = Vec::with_capacity(ranges.len());
    for range in ranges {
        insert(&mut canonical, *range);
    }
    canonical
}

// the code point one past `end`, saturating at the top of the domain so that
// adjacency checks near 0x10FFFF cannot overflow
fn adjacent_end(end: u32) -> u32 {
    end.saturating_add(1)
}

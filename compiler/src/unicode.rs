//! Built-in escape tables and the host boundary for Unicode property data.

use crate::range_set::CodePointRange;

/// `\d`
pub const DIGIT: [CodePointRange; 1] = [CodePointRange::new(0x30, 0x39)];

/// `\w` — ASCII digits, both letter cases and the underscore.
pub const WORD: [CodePointRange; 4] = [
    CodePointRange::new(0x30, 0x39),
    CodePointRange::new(0x41, 0x5A),
    CodePointRange::single(0x5F),
    CodePointRange::new(0x61, 0x7A),
];

/// `\s` — whitespace and line terminators, canonically ordered.
pub const WHITESPACE: [CodePointRange; 5] = [
    CodePointRange::new(0x09, 0x0D),
    CodePointRange::single(0x20),
    CodePointRange::single(0xA0),
    CodePointRange::new(0x2028, 0x2029),
    CodePointRange::single(0xFEFF),
];

/// Code points recognized as line terminators by `^` and `$` in multiline
/// mode and excluded by `.` without the `s` flag.
pub const LINE_TERMINATORS: [CodePointRange; 3] = [
    CodePointRange::single(0x0A),
    CodePointRange::single(0x0D),
    CodePointRange::new(0x2028, 0x2029),
];

/// Source of code-point range data for `\p{...}` escapes.
///
/// Property data is large and version-dependent, so the compiler takes it
/// from the host rather than bundling tables. Keys take the form
/// `"General_Category/Lu"` or `"Binary_Property/Alphabetic"`; a `None`
/// return means the property is not recognized and compilation fails.
pub trait UnicodeTables {
    fn ranges(&self, key: &str) -> Option<Vec<CodePointRange>>;
}

/// A table source that recognizes no properties, for hosts whose patterns
/// never use `\p{...}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUnicodeTables;

impl UnicodeTables for NoUnicodeTables {
    fn ranges(&self, _key: &str) -> Option<Vec<CodePointRange>> {
        None
    }
}

//! The host-facing match interface.
//!
//! A [Regexp] pairs a compiled program with the flags it was compiled under
//! and drives the interpreter over a string subject. Compiled programs only
//! ever match at their seeded start position, so unanchored search is
//! realized here by retrying successive start offsets.

use regexp_runtime::{ExecutionError, Instructions, Interpreter, SaveSlots};

use crate::ast::Pattern;
use crate::compiler::{compile, ConstructionError, Flags};
use crate::unicode::UnicodeTables;

/// A compiled pattern ready for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Regexp {
    program: Instructions,
    flags: Flags,
}

impl Regexp {
    pub fn new(
        pattern: &Pattern,
        flags: Flags,
        tables: &impl UnicodeTables,
    ) -> Result<Self, ConstructionError> {
        compile(pattern, flags, tables).map(|program| Self { program, flags })
    }

    pub fn program(&self) -> &Instructions {
        &self.program
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Encodes a subject into the symbol sequence the program runs over:
    /// code points under the `u` flag, UTF-16 code units otherwise.
    pub fn encode(&self, subject: &str) -> Vec<u32> {
        if self.flags.unicode {
            subject.chars().map(u32::from).collect()
        } else {
            subject.encode_utf16().map(u32::from).collect()
        }
    }

    /// Returns the first match in the subject, searching every start offset
    /// in order.
    pub fn find(&self, subject: &str) -> Result<Option<Match>, ExecutionError> {
        let input = self.encode(subject);
        self.find_from(&input, 0)
    }

    /// Returns every match in the subject under global-iteration rules: a
    /// non-empty match resumes at its end, an empty match one symbol later,
    /// and iteration ends once the resume offset reaches the subject length.
    pub fn find_all(&self, subject: &str) -> Result<Vec<Match>, ExecutionError> {
        let input = self.encode(subject);
        let mut matches = vec![];
        let mut offset = 0;

        while let Some(found) = self.find_from(&input, offset)? {
            let (start, end) = (found.start, found.end);
            matches.push(found);

            offset = if end != start { end } else { end + 1 };
            if offset >= input.len() {
                break;
            }
        }

        Ok(matches)
    }

    fn find_from(&self, input: &[u32], offset: usize) -> Result<Option<Match>, ExecutionError> {
        for start in offset..=input.len() {
            let slots = Interpreter::new(&self.program, input, start).find_next_match()?;
            if let Some(slots) = slots {
                return Match::from_slots(&slots, input).map(Some);
            }
        }

        Ok(None)
    }
}

/// A single successful match, with one capture entry per group. Offsets index
/// the encoded symbol sequence, not subject bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    groups: Vec<CaptureGroup>,
}

impl Match {
    fn from_slots(slots: &SaveSlots, input: &[u32]) -> Result<Self, ExecutionError> {
        let (start, end) = slots.group(0).ok_or(ExecutionError::UnmarkedMatch)?;
        let groups = (0..slots.groups())
            .map(|group| match slots.group(group) {
                Some((start, end)) => CaptureGroup::Captured {
                    start,
                    end,
                    symbols: input[start..end].to_vec(),
                },
                None => CaptureGroup::Undefined,
            })
            .collect();

        Ok(Self { start, end, groups })
    }

    /// The capture entry for a group, with group 0 covering the whole match.
    pub fn group(&self, group: usize) -> Option<&CaptureGroup> {
        self.groups.get(group)
    }

    pub fn groups(&self) -> &[CaptureGroup] {
        &self.groups
    }
}

/// The outcome of one capturing group within a match. A group inside an
/// unexercised alternative or an unentered optional stays undefined, which is
/// distinct from a captured empty span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureGroup {
    Undefined,
    Captured {
        start: usize,
        end: usize,
        symbols: Vec<u32>,
    },
}

impl CaptureGroup {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Captured { .. })
    }

    /// The captured span, or `None` for an undefined group.
    pub fn span(&self) -> Option<(usize, usize)> {
        match self {
            Self::Undefined => None,
            Self::Captured { start, end, .. } => Some((*start, *end)),
        }
    }
}

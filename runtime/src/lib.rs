//! Provides the bytecode instruction set and the Pike-VM interpreter used to
//! evaluate compiled regexp programs against an input symbol sequence.
//!
//! A program is an ordered sequence of [Opcode]s addressed by plain integer
//! program counters. The interpreter simulates every viable execution branch
//! of the program as a logical thread, exploring branches depth-first in
//! priority order so that the first accepted match is the leftmost, greediest
//! one.
//!
//! # Example
//!
//! ```
//! use regexp_runtime::*;
//!
//! // approximate to `a*` against "aaab"
//! let program = Instructions::default().with_opcodes(vec![
//!     Opcode::StartSave(InstStartSave::new(0)),
//!     Opcode::Fork(InstFork::new(InstIndex::from(4))),
//!     Opcode::ConsumeRange(InstConsumeRange::new(97, 97)),
//!     Opcode::Jmp(InstJmp::new(InstIndex::from(1))),
//!     Opcode::EndSave(InstEndSave::new(0)),
//!     Opcode::Match,
//! ]);
//!
//! let input = "aaab".chars().map(u32::from).collect::<Vec<_>>();
//! let slots = Interpreter::new(&program, &input, 0)
//!     .find_next_match()
//!     .expect("program and interpreter disagree")
//!     .expect("no match found");
//!
//! // the greedy star consumes all three `a`s.
//! assert_eq!(Some((0, 3)), slots.group(0));
//! ```

pub mod interpreter;

pub use interpreter::{Interpreter, SaveSlots, Thread};

use std::fmt::{Debug, Display};

/// Represents all fatal conditions the interpreter can signal. Each variant
/// indicates a contract mismatch between a program and the interpreter and is
/// never recovered; an unmatched input is an ordinary `None` result instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// A thread advanced beyond the end of the program without reaching a
    /// `Match` instruction.
    #[error("program counter {0:04} lies outside the program")]
    PcOutOfBounds(u32),

    /// A save or backreference instruction named a group for which no
    /// registers were allocated.
    #[error("save group {0} lies outside the allocated registers")]
    SaveSlotOutOfBounds(usize),

    /// A blocked thread woke up on an opcode that consumes no input.
    #[error("thread blocked on a non-consuming opcode at {0:04}")]
    BlockedOnNonConsuming(u32),

    /// A thread blocked on a backreference whose group registers were unset.
    #[error("blocked backreference at {0:04} references an unset group")]
    UnsetBackreference(u32),

    /// An accepting thread never recorded the whole-match registers.
    #[error("accepted match did not record the whole-match registers")]
    UnmarkedMatch,
}

/// An instruction program, paired with the number of save groups its save
/// instructions address beyond the implicit whole-match group.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct Instructions {
    save_groups: usize,
    program: Vec<Instruction>,
}

impl Instructions {
    #[must_use]
    pub fn new(save_groups: usize, program: Vec<Opcode>) -> Self {
        Self {
            save_groups,
            program: program
                .into_iter()
                .enumerate()
                .map(|(id, opcode)| Instruction::new(id, opcode))
                .collect(),
        }
    }

    pub fn with_opcodes(self, program: Vec<Opcode>) -> Self {
        Self {
            save_groups: self.save_groups,
            program: program
                .into_iter()
                .enumerate()
                .map(|(id, opcode)| Instruction::new(id, opcode))
                .collect(),
        }
    }

    pub fn with_save_groups(self, save_groups: usize) -> Self {
        Self {
            save_groups,
            program: self.program,
        }
    }

    /// Returns the number of save groups addressed by the program, excluding
    /// the whole-match group 0.
    pub fn save_groups(&self) -> usize {
        self.save_groups
    }

    pub fn len(&self) -> usize {
        self.program.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: InstIndex) -> Option<&Opcode> {
        self.program.get(index.as_usize()).map(|inst| &inst.opcode)
    }
}

impl Display for Instructions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for inst in self.program.iter() {
            writeln!(f, "{:04}: {}", inst.id, inst.opcode)?
        }

        Ok(())
    }
}

impl std::ops::Index<InstIndex> for Instructions {
    type Output = Opcode;

    fn index(&self, index: InstIndex) -> &Self::Output {
        let idx = index.as_usize();
        &self.program[idx].opcode
    }
}

impl AsRef<[Instruction]> for Instructions {
    fn as_ref(&self) -> &[Instruction] {
        &self.program
    }
}

/// An absolute program counter into an [Instructions] sequence.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstIndex(u32);

impl InstIndex {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for InstIndex {
    fn from(ptr: u32) -> Self {
        Self(ptr)
    }
}

impl std::ops::Add<u32> for InstIndex {
    type Output = Self;

    fn add(self, rhs: u32) -> Self::Output {
        let new_ptr = self.0 + rhs;

        InstIndex::from(new_ptr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    id: usize,
    opcode: Opcode,
}

impl Instruction {
    #[must_use]
    pub fn new(id: usize, opcode: Opcode) -> Self {
        Self { id, opcode }
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}: {}", self.id, self.opcode)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    Jmp(InstJmp),
    Fork(InstFork),
    ConsumeRange(InstConsumeRange),
    Assertion(InstAssertion),
    StartSave(InstStartSave),
    EndSave(InstEndSave),
    Backref(InstBackref),
    Match,
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Opcode::Match => Display::fmt(&InstMatch, f),
            Opcode::Jmp(i) => Display::fmt(&i, f),
            Opcode::Fork(i) => Display::fmt(&i, f),
            Opcode::ConsumeRange(i) => Display::fmt(&i, f),
            Opcode::Assertion(i) => Display::fmt(&i, f),
            Opcode::StartSave(i) => Display::fmt(&i, f),
            Opcode::EndSave(i) => Display::fmt(&i, f),
            Opcode::Backref(i) => Display::fmt(&i, f),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct InstMatch;

impl Display for InstMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Match",)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstJmp {
    pub next: InstIndex,
}

impl InstJmp {
    #[must_use]
    pub fn new(next: InstIndex) -> Self {
        Self { next }
    }
}

impl Display for InstJmp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Jump: ({:04})", self.next.as_u32())
    }
}

/// Fork splits the active thread in two. The forking thread continues with
/// the directly following instruction while its clone is queued at the branch
/// target, encoding a preference for the fall-through path.
#[derive(Debug, Clone, PartialEq)]
pub struct InstFork {
    pub to: InstIndex,
}

impl InstFork {
    #[must_use]
    pub fn new(to: InstIndex) -> Self {
        Self { to }
    }
}

impl Display for InstFork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fork: ({:04})", self.to.as_u32())
    }
}

/// Consumes a single input symbol whose value lies in the inclusive
/// `[min, max]` interval.
#[derive(Debug, Clone, PartialEq)]
pub struct InstConsumeRange {
    pub min: u32,
    pub max: u32,
}

impl InstConsumeRange {
    #[must_use]
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

impl Display for InstConsumeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConsumeRange: [{:#06x}-{:#06x}]", self.min, self.max)
    }
}

/// A zero-width condition evaluated against the current input position.
///
/// The line variants are the multiline renditions of `^` and `$`, resolved
/// by the compiler from the pattern flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertionKind {
    StartOfInput,
    EndOfInput,
    StartOfLine,
    EndOfLine,
    WordBoundary,
    NonWordBoundary,
}

impl Display for AssertionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssertionKind::StartOfInput => write!(f, "^"),
            AssertionKind::EndOfInput => write!(f, "$"),
            AssertionKind::StartOfLine => write!(f, "^m"),
            AssertionKind::EndOfLine => write!(f, "$m"),
            AssertionKind::WordBoundary => write!(f, "\\b"),
            AssertionKind::NonWordBoundary => write!(f, "\\B"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstAssertion {
    pub kind: AssertionKind,
}

impl InstAssertion {
    #[must_use]
    pub fn new(kind: AssertionKind) -> Self {
        Self { kind }
    }
}

impl Display for InstAssertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Assertion: {}", self.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstStartSave {
    pub slot_id: usize,
}

impl InstStartSave {
    #[must_use]
    pub fn new(slot_id: usize) -> Self {
        Self { slot_id }
    }
}

impl Display for InstStartSave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StartSave[{:04}]", self.slot_id,)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstEndSave {
    pub slot_id: usize,
}

impl InstEndSave {
    #[must_use]
    pub fn new(slot_id: usize) -> Self {
        Self { slot_id }
    }
}

impl Display for InstEndSave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EndSave[{:04}]", self.slot_id,)
    }
}

/// Requires the input to reproduce, symbol for symbol, the text most recently
/// captured by the referenced save group. An unset or empty group is
/// satisfied without consuming input.
#[derive(Debug, Clone, PartialEq)]
pub struct InstBackref {
    pub group: usize,
}

impl InstBackref {
    #[must_use]
    pub fn new(group: usize) -> Self {
        Self { group }
    }
}

impl Display for InstBackref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Backref[{:04}]", self.group,)
    }
}

/// Returns true for symbols treated as word characters by the `\b` and `\B`
/// assertions: ASCII letters and digits.
pub fn is_word_symbol(symbol: u32) -> bool {
    matches!(symbol, 0x30..=0x39 | 0x41..=0x5A | 0x61..=0x7A)
}

/// Returns true for the line-terminator symbols recognized by the multiline
/// `^` and `$` assertions.
pub fn is_line_terminator(symbol: u32) -> bool {
    matches!(symbol, 0x000A | 0x000D | 0x2028 | 0x2029)
}

//! Lowers a pattern syntax tree into an executable instruction program.

use regexp_runtime::{
    AssertionKind, InstAssertion, InstBackref, InstConsumeRange, InstEndSave, InstFork, InstIndex,
    InstJmp, InstStartSave, Instructions, Opcode,
};

use crate::ast::{
    Alternative, Anchor, Atom, AtomEscape, CharacterClass, ClassEscape, ClassMember, Disjunction,
    Group, Pattern, PropertyExpression, Quantifier, QuantifierPrefix, Term,
};
use crate::range_set::{canonicalize, complement, insert, CodePointRange, MAX_CODE_POINT};
use crate::unicode::{UnicodeTables, DIGIT, LINE_TERMINATORS, WHITESPACE, WORD};

/// Pattern flags recognized by the compiler.
///
/// Other flag letters affect only the host-side match loop and are ignored
/// here.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
    /// `u` — the subject is treated as a sequence of code points rather than
    /// code units.
    pub unicode: bool,
    /// `s` — `.` also matches line terminators.
    pub dot_all: bool,
    /// `m` — `^` and `$` match at line boundaries.
    pub multiline: bool,
}

impl Flags {
    pub fn parse(flags: &str) -> Self {
        Self {
            unicode: flags.contains('u'),
            dot_all: flags.contains('s'),
            multiline: flags.contains('m'),
        }
    }
}

/// Represents all conditions under which a pattern is rejected at compile
/// time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// A `\p{...}` escape named a property the host's tables do not carry.
    #[error("unknown unicode property \"{0}\"")]
    UnknownProperty(String),

    /// A `{m,n}` quantifier with a minimum above its maximum.
    #[error("quantifier minimum {0} exceeds maximum {1}")]
    ReversedQuantifier(u64, u64),

    /// A class range whose start code point lies above its end.
    #[error("class range start {0:#06x} exceeds end {1:#06x}")]
    ReversedClassRange(u32, u32),

    /// A backreference naming a group the pattern does not define.
    #[error("backreference to undefined group {0}")]
    InvalidBackreference(usize),
}

/// A forward-referenceable program position handed out by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Label(usize);

#[derive(Debug, Default)]
struct LabelState {
    /// The bound program counter, once known.
    pc: Option<InstIndex>,
    /// Offsets of emitted branch opcodes awaiting the bound pc.
    patches: Vec<usize>,
}

struct CodeGenerator<'a, T> {
    opcodes: Vec<Opcode>,
    labels: Vec<LabelState>,
    flags: Flags,
    capturing_groups: usize,
    tables: &'a T,
}

impl<'a, T: UnicodeTables> CodeGenerator<'a, T> {
    fn new(flags: Flags, capturing_groups: usize, tables: &'a T) -> Self {
        Self {
            opcodes: vec![],
            labels: vec![],
            flags,
            capturing_groups,
            tables,
        }
    }

    // label management

    fn label(&mut self) -> Label {
        let label = Label(self.labels.len());
        self.labels.push(LabelState::default());
        label
    }

    /// Pins a label to the next emitted opcode, rewriting every branch that
    /// referenced it ahead of time.
    fn bind(&mut self, label: Label) {
        let pc = InstIndex::from(self.opcodes.len() as u32);
        let state = &mut self.labels[label.0];
        state.pc = Some(pc);

        for patch in state.patches.drain(..) {
            match &mut self.opcodes[patch] {
                Opcode::Jmp(inst) => inst.next = pc,
                Opcode::Fork(inst) => inst.to = pc,
                _ => (),
            }
        }
    }

    /// Resolves a branch target, recording a patch if the label is unbound.
    fn branch_target(&mut self, target: Label) -> InstIndex {
        let state = &mut self.labels[target.0];
        match state.pc {
            Some(pc) => pc,
            None => {
                state.patches.push(self.opcodes.len());
                InstIndex::from(u32::MAX)
            }
        }
    }

    // opcode emission

    fn jump(&mut self, target: Label) {
        let pc = self.branch_target(target);
        self.opcodes.push(Opcode::Jmp(InstJmp::new(pc)));
    }

    fn fork(&mut self, target: Label) {
        let pc = self.branch_target(target);
        self.opcodes.push(Opcode::Fork(InstFork::new(pc)));
    }

    fn consume_range(&mut self, range: CodePointRange) {
        self.opcodes.push(Opcode::ConsumeRange(InstConsumeRange::new(
            range.start,
            range.end,
        )));
    }

    /// Emits a branch tree accepting any symbol inside the given canonical
    /// range list. An empty list lowers to a single range no symbol
    /// satisfies, so the consuming thread always dies.
    fn consume_ranges(&mut self, ranges: &[CodePointRange]) {
        match ranges {
            [] => self.opcodes.push(Opcode::ConsumeRange(InstConsumeRange::new(
                MAX_CODE_POINT + 1,
                MAX_CODE_POINT + 1,
            ))),
            [only] => self.consume_range(*only),
            [init @ .., last] => {
                let done = self.label();
                for range in init {
                    let next = self.label();
                    self.fork(next);
                    self.consume_range(*range);
                    self.jump(done);
                    self.bind(next);
                }
                self.consume_range(*last);
                self.bind(done);
            }
        }
    }

    fn assertion(&mut self, kind: AssertionKind) {
        self.opcodes
            .push(Opcode::Assertion(InstAssertion::new(kind)));
    }

    fn start_save(&mut self, slot_id: usize) {
        self.opcodes
            .push(Opcode::StartSave(InstStartSave::new(slot_id)));
    }

    fn end_save(&mut self, slot_id: usize) {
        self.opcodes.push(Opcode::EndSave(InstEndSave::new(slot_id)));
    }

    // tree lowering

    fn pattern(&mut self, pattern: &Pattern) -> Result<(), ConstructionError> {
        self.start_save(0);
        self.disjunction(&pattern.disjunction)?;
        self.end_save(0);
        self.opcodes.push(Opcode::Match);
        Ok(())
    }

    /// Alternatives are tried in pattern order. Each fork prefers its
    /// fall-through path, so earlier alternatives run at higher priority.
    fn disjunction(&mut self, disjunction: &Disjunction) -> Result<(), ConstructionError> {
        match disjunction.0.split_last() {
            None => Ok(()),
            Some((last, init)) => {
                let end = self.label();
                for alternative in init {
                    let next = self.label();
                    self.fork(next);
                    self.alternative(alternative)?;
                    self.jump(end);
                    self.bind(next);
                }
                self.alternative(last)?;
                self.bind(end);
                Ok(())
            }
        }
    }

    fn alternative(&mut self, alternative: &Alternative) -> Result<(), ConstructionError> {
        for term in &alternative.0 {
            self.term(term)?;
        }
        Ok(())
    }

    fn term(&mut self, term: &Term) -> Result<(), ConstructionError> {
        match term {
            Term::Anchor(anchor) => {
                self.assertion(self.anchor_kind(*anchor));
                Ok(())
            }
            Term::Atom {
                atom,
                quantifier: None,
            } => self.atom(atom),
            Term::Atom {
                atom,
                quantifier: Some(quantifier),
            } => self.quantified_atom(atom, *quantifier),
        }
    }

    fn anchor_kind(&self, anchor: Anchor) -> AssertionKind {
        match anchor {
            Anchor::Start if self.flags.multiline => AssertionKind::StartOfLine,
            Anchor::Start => AssertionKind::StartOfInput,
            Anchor::End if self.flags.multiline => AssertionKind::EndOfLine,
            Anchor::End => AssertionKind::EndOfInput,
            Anchor::WordBoundary => AssertionKind::WordBoundary,
            Anchor::NonWordBoundary => AssertionKind::NonWordBoundary,
        }
    }

    /// Quantifiers lower to the mandatory repetitions followed by either a
    /// loop (unbounded) or a run of optional repetitions (bounded). Greedy
    /// forms put the repeating path on the preferred fall-through side of
    /// each fork; lazy forms put the exit there instead.
    fn quantified_atom(
        &mut self,
        atom: &Atom,
        quantifier: Quantifier,
    ) -> Result<(), ConstructionError> {
        let (min, max) = match quantifier.prefix {
            QuantifierPrefix::ZeroOrOne => (0, Some(1)),
            QuantifierPrefix::ZeroOrMore => (0, None),
            QuantifierPrefix::OneOrMore => (1, None),
            QuantifierPrefix::Exactly(n) => (n, Some(n)),
            QuantifierPrefix::AtLeast(n) => (n, None),
            QuantifierPrefix::Between(m, n) if m > n => {
                return Err(ConstructionError::ReversedQuantifier(m, n))
            }
            QuantifierPrefix::Between(m, n) => (m, Some(n)),
        };

        for _ in 0..min {
            self.atom(atom)?;
        }

        match max {
            None if quantifier.greedy => {
                let begin = self.label();
                let end = self.label();
                self.bind(begin);
                self.fork(end);
                self.atom(atom)?;
                self.jump(begin);
                self.bind(end);
            }
            None => {
                let begin = self.label();
                let body = self.label();
                let end = self.label();
                self.bind(begin);
                self.fork(body);
                self.jump(end);
                self.bind(body);
                self.atom(atom)?;
                self.jump(begin);
                self.bind(end);
            }
            Some(max) if quantifier.greedy => {
                let end = self.label();
                for _ in min..max {
                    self.fork(end);
                    self.atom(atom)?;
                }
                self.bind(end);
            }
            Some(max) => {
                let end = self.label();
                for _ in min..max {
                    let body = self.label();
                    self.fork(body);
                    self.jump(end);
                    self.bind(body);
                    self.atom(atom)?;
                }
                self.bind(end);
            }
        }

        Ok(())
    }

    fn atom(&mut self, atom: &Atom) -> Result<(), ConstructionError> {
        match atom {
            Atom::Character(c) => {
                self.consume_range(CodePointRange::single(*c));
                Ok(())
            }
            Atom::Any if self.flags.dot_all => {
                self.consume_range(CodePointRange::new(0, MAX_CODE_POINT));
                Ok(())
            }
            Atom::Any => {
                let ranges = complement(&LINE_TERMINATORS);
                self.consume_ranges(&ranges);
                Ok(())
            }
            Atom::CharacterClass(class) => {
                let ranges = self.character_class_ranges(class)?;
                self.consume_ranges(&ranges);
                Ok(())
            }
            Atom::Escape(escape) => self.atom_escape(escape),
            Atom::Group(Group::Capturing {
                preceding_captures,
                disjunction,
            }) => {
                let slot_id = preceding_captures + 1;
                self.start_save(slot_id);
                self.disjunction(disjunction)?;
                self.end_save(slot_id);
                Ok(())
            }
            Atom::Group(Group::NonCapturing { disjunction }) => self.disjunction(disjunction),
        }
    }

    fn atom_escape(&mut self, escape: &AtomEscape) -> Result<(), ConstructionError> {
        match escape {
            AtomEscape::Backreference(group) => {
                if *group == 0 || *group > self.capturing_groups {
                    return Err(ConstructionError::InvalidBackreference(*group));
                }
                self.opcodes.push(Opcode::Backref(InstBackref::new(*group)));
                Ok(())
            }
            AtomEscape::Character(c) => {
                self.consume_range(CodePointRange::single(*c));
                Ok(())
            }
            AtomEscape::Class(class_escape) => {
                let ranges = self.class_escape_ranges(class_escape)?;
                self.consume_ranges(&ranges);
                Ok(())
            }
        }
    }

    fn class_escape_ranges(
        &self,
        escape: &ClassEscape,
    ) -> Result<Vec<CodePointRange>, ConstructionError> {
        match escape {
            ClassEscape::Digit => Ok(DIGIT.to_vec()),
            ClassEscape::NotDigit => Ok(complement(&DIGIT)),
            ClassEscape::Whitespace => Ok(WHITESPACE.to_vec()),
            ClassEscape::NotWhitespace => Ok(complement(&WHITESPACE)),
            ClassEscape::Word => Ok(WORD.to_vec()),
            ClassEscape::NotWord => Ok(complement(&WORD)),
            ClassEscape::Property {
                negated,
                expression,
            } => {
                let ranges = canonicalize(&self.property_ranges(expression)?);
                if *negated {
                    Ok(complement(&ranges))
                } else {
                    Ok(ranges)
                }
            }
        }
    }

    fn property_ranges(
        &self,
        expression: &PropertyExpression,
    ) -> Result<Vec<CodePointRange>, ConstructionError> {
        match expression {
            PropertyExpression::NameValue { name, value } => self
                .tables
                .ranges(&format!("{}/{}", name, value))
                .ok_or_else(|| {
                    ConstructionError::UnknownProperty(format!("{}={}", name, value))
                }),
            // a lone token is a General_Category value or, failing that, a
            // binary property name
            PropertyExpression::Lone(token) => self
                .tables
                .ranges(&format!("General_Category/{}", token))
                .or_else(|| self.tables.ranges(&format!("Binary_Property/{}", token)))
                .ok_or_else(|| ConstructionError::UnknownProperty(token.clone())),
        }
    }

    fn character_class_ranges(
        &self,
        class: &CharacterClass,
    ) -> Result<Vec<CodePointRange>, ConstructionError> {
        let mut ranges = vec![];

        for member in &class.members {
            match member {
                ClassMember::Single(c) => insert(&mut ranges, CodePointRange::single(*c)),
                ClassMember::Range(start, end) if start > end => {
                    return Err(ConstructionError::ReversedClassRange(*start, *end))
                }
                ClassMember::Range(start, end) => {
                    insert(&mut ranges, CodePointRange::new(*start, *end))
                }
                ClassMember::Escape(escape) => {
                    for range in self.class_escape_ranges(escape)? {
                        insert(&mut ranges, range);
                    }
                }
            }
        }

        if class.invert {
            Ok(complement(&ranges))
        } else {
            Ok(ranges)
        }
    }

    fn finish(self) -> Instructions {
        Instructions::new(self.capturing_groups, self.opcodes)
    }
}

/// Compiles a pattern into an instruction program executable by the
/// interpreter.
///
/// Backreferences are validated against the pattern's capture count, so the
/// resulting program never addresses registers the interpreter does not
/// allocate.
pub fn compile(
    pattern: &Pattern,
    flags: Flags,
    tables: &impl UnicodeTables,
) -> Result<Instructions, ConstructionError> {
    let mut generator = CodeGenerator::new(flags, pattern.capturing_groups, tables);
    generator.pattern(pattern)?;
    let program = generator.finish();

    log::trace!(
        "compiled {} capture group program:\n{}",
        program.save_groups(),
        program
    );

    Ok(program)
}

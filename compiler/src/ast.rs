//! The parsed pattern syntax tree consumed by the compiler.
//!
//! These shapes mirror the grammar productions of the host's regexp parser:
//! a [Pattern] holds a [Disjunction] of [Alternative]s, each a sequence of
//! [Term]s. The compiler borrows the tree read-only; building one by hand is
//! supported for hosts that synthesize patterns.

/// Root of a parsed pattern.
#[derive(Debug, PartialEq, Eq)]
pub struct Pattern {
    pub disjunction: Disjunction,
    /// Number of capturing groups in the pattern, excluding the implicit
    /// whole-match group 0.
    pub capturing_groups: usize,
}

impl Pattern {
    pub fn new(disjunction: Disjunction, capturing_groups: usize) -> Self {
        Self {
            disjunction,
            capturing_groups,
        }
    }
}

/// `a|b|c` — alternatives in pattern order; the leftmost is matched first.
#[derive(Debug, PartialEq, Eq)]
pub struct Disjunction(pub Vec<Alternative>);

/// A possibly empty sequence of terms matched one after another.
#[derive(Debug, PartialEq, Eq)]
pub struct Alternative(pub Vec<Term>);

#[derive(Debug, PartialEq, Eq)]
pub enum Term {
    Anchor(Anchor),
    Atom {
        atom: Atom,
        quantifier: Option<Quantifier>,
    },
}

impl Term {
    pub fn atom(atom: Atom) -> Self {
        Self::Atom {
            atom,
            quantifier: None,
        }
    }

    pub fn quantified(atom: Atom, quantifier: Quantifier) -> Self {
        Self::Atom {
            atom,
            quantifier: Some(quantifier),
        }
    }
}

/// The zero-width assertion subtypes `^`, `$`, `\b` and `\B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
    WordBoundary,
    NonWordBoundary,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Atom {
    /// A single literal code point.
    Character(u32),
    /// `.`
    Any,
    CharacterClass(CharacterClass),
    Escape(AtomEscape),
    Group(Group),
}

impl From<CharacterClass> for Atom {
    fn from(src: CharacterClass) -> Self {
        Self::CharacterClass(src)
    }
}

impl From<AtomEscape> for Atom {
    fn from(src: AtomEscape) -> Self {
        Self::Escape(src)
    }
}

impl From<Group> for Atom {
    fn from(src: Group) -> Self {
        Self::Group(src)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Group {
    Capturing {
        /// Count of capturing parentheses opening before this group in
        /// left-to-right pattern order; the group's save index is one more.
        preceding_captures: usize,
        disjunction: Disjunction,
    },
    NonCapturing {
        disjunction: Disjunction,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub enum AtomEscape {
    /// `\1` through `\9` — a decimal backreference.
    Backreference(usize),
    /// A character escape resolved by the parser to its code point.
    Character(u32),
    /// `\d`, `\D`, `\s`, `\S`, `\w`, `\W`, `\p{...}`, `\P{...}`
    Class(ClassEscape),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClassEscape {
    Digit,
    NotDigit,
    Whitespace,
    NotWhitespace,
    Word,
    NotWord,
    Property {
        negated: bool,
        expression: PropertyExpression,
    },
}

/// The body of a `\p{...}` escape.
#[derive(Debug, PartialEq, Eq)]
pub enum PropertyExpression {
    /// `\p{Name=Value}`
    NameValue { name: String, value: String },
    /// `\p{Token}` — a lone General_Category value or binary property name.
    Lone(String),
}

/// `[...]` — ranges are resolved against the same escape tables as atoms;
/// negation applies to the canonicalized union of all members.
#[derive(Debug, PartialEq, Eq)]
pub struct CharacterClass {
    pub invert: bool,
    pub members: Vec<ClassMember>,
}

impl CharacterClass {
    pub fn new(invert: bool, members: Vec<ClassMember>) -> Self {
        Self { invert, members }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ClassMember {
    Single(u32),
    Range(u32, u32),
    Escape(ClassEscape),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantifier {
    pub prefix: QuantifierPrefix,
    pub greedy: bool,
}

impl Quantifier {
    pub fn eager(prefix: QuantifierPrefix) -> Self {
        Self {
            prefix,
            greedy: true,
        }
    }

    pub fn lazy(prefix: QuantifierPrefix) -> Self {
        Self {
            prefix,
            greedy: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierPrefix {
    /// `?`
    ZeroOrOne,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `{n}`
    Exactly(u64),
    /// `{n,}`
    AtLeast(u64),
    /// `{m,n}`
    Between(u64, u64),
}

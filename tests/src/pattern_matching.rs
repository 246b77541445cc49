use pretty_assertions::assert_eq;

use regexp_compiler::ast::{
    Alternative, Anchor, Atom, AtomEscape, CharacterClass, ClassEscape, ClassMember, Disjunction,
    Group, Pattern, PropertyExpression, Quantifier, QuantifierPrefix, Term,
};
use regexp_compiler::range_set::CodePointRange;
use regexp_compiler::unicode::{NoUnicodeTables, UnicodeTables};
use regexp_compiler::{Flags, Regexp};

fn character(c: char) -> Term {
    Term::atom(Atom::Character(u32::from(c)))
}

fn literal(literal: &str) -> Vec<Term> {
    literal.chars().map(character).collect()
}

fn capturing(preceding_captures: usize, terms: Vec<Term>) -> Term {
    Term::atom(Atom::Group(Group::Capturing {
        preceding_captures,
        disjunction: Disjunction(vec![Alternative(terms)]),
    }))
}

fn pattern(terms: Vec<Term>, capturing_groups: usize) -> Pattern {
    Pattern::new(Disjunction(vec![Alternative(terms)]), capturing_groups)
}

fn spans_of(regexp: &Regexp, subject: &str) -> Vec<(usize, usize)> {
    regexp
        .find_all(subject)
        .map(|matches| matches.iter().map(|m| (m.start, m.end)).collect())
        .unwrap_or_else(|e| panic!("execution failed: {}", e))
}

fn span_of(regexp: &Regexp, subject: &str) -> Option<(usize, usize)> {
    regexp
        .find(subject)
        .map(|found| found.map(|m| (m.start, m.end)))
        .unwrap_or_else(|e| panic!("execution failed: {}", e))
}

fn compile(pattern: &Pattern, flags: Flags) -> Regexp {
    Regexp::new(pattern, flags, &NoUnicodeTables)
        .unwrap_or_else(|e| panic!("construction failed: {}", e))
}

#[test]
fn should_prefer_the_longest_span_under_a_greedy_quantifier() {
    // (a*)ab — the group must give symbols back for the tail to match
    let pattern = pattern(
        vec![
            capturing(
                0,
                vec![Term::quantified(
                    Atom::Character('a' as u32),
                    Quantifier::eager(QuantifierPrefix::ZeroOrMore),
                )],
            ),
            character('a'),
            character('b'),
        ],
        1,
    );
    let regexp = compile(&pattern, Flags::default());

    let found = regexp.find("aaab").ok().flatten();
    let group = found.as_ref().and_then(|m| m.group(1)).and_then(|g| g.span());

    assert_eq!(Some((0, 4)), found.map(|m| (m.start, m.end)));
    assert_eq!(Some((0, 2)), group);
}

#[test]
fn should_prefer_the_shortest_span_under_a_lazy_quantifier() {
    // (a*?)a
    let pattern = pattern(
        vec![
            capturing(
                0,
                vec![Term::quantified(
                    Atom::Character('a' as u32),
                    Quantifier::lazy(QuantifierPrefix::ZeroOrMore),
                )],
            ),
            character('a'),
        ],
        1,
    );
    let regexp = compile(&pattern, Flags::default());

    let found = regexp.find("aaa").ok().flatten();
    let group = found.as_ref().and_then(|m| m.group(1)).and_then(|g| g.span());

    assert_eq!(Some((0, 1)), found.map(|m| (m.start, m.end)));
    assert_eq!(Some((0, 0)), group);
}

#[test]
fn should_match_a_backreference_only_against_the_captured_text() {
    // (a|b)\1
    let pattern = pattern(
        vec![
            Term::atom(Atom::Group(Group::Capturing {
                preceding_captures: 0,
                disjunction: Disjunction(vec![
                    Alternative(vec![character('a')]),
                    Alternative(vec![character('b')]),
                ]),
            })),
            Term::atom(Atom::Escape(AtomEscape::Backreference(1))),
        ],
        1,
    );
    let regexp = compile(&pattern, Flags::default());

    assert_eq!(Some((0, 2)), span_of(&regexp, "aa"));
    assert_eq!(Some((0, 2)), span_of(&regexp, "bb"));
    assert_eq!(None, span_of(&regexp, "ab"));
}

#[test]
fn should_satisfy_a_backreference_to_an_unset_group_without_consuming() {
    // (a)?\1b
    let pattern = pattern(
        vec![
            Term::quantified(
                Atom::Group(Group::Capturing {
                    preceding_captures: 0,
                    disjunction: Disjunction(vec![Alternative(vec![character('a')])]),
                }),
                Quantifier::eager(QuantifierPrefix::ZeroOrOne),
            ),
            Term::atom(Atom::Escape(AtomEscape::Backreference(1))),
            character('b'),
        ],
        1,
    );
    let regexp = compile(&pattern, Flags::default());

    assert_eq!(Some((0, 3)), span_of(&regexp, "aab"));
    assert_eq!(Some((0, 1)), span_of(&regexp, "b"));
}

#[test]
fn should_anchor_to_the_whole_subject_without_the_multiline_flag() {
    // ^abc$
    let mut terms = vec![Term::Anchor(Anchor::Start)];
    terms.extend(literal("abc"));
    terms.push(Term::Anchor(Anchor::End));
    let regexp = compile(&pattern(terms, 0), Flags::default());

    assert_eq!(Some((0, 3)), span_of(&regexp, "abc"));
    assert_eq!(None, span_of(&regexp, "xabc"));
    assert_eq!(None, span_of(&regexp, "abcx"));
}

#[test]
fn should_anchor_to_line_boundaries_under_the_multiline_flag() {
    // ^a with the m flag, globally
    let mut terms = vec![Term::Anchor(Anchor::Start)];
    terms.push(character('a'));
    let regexp = compile(&pattern(terms, 0), Flags::parse("m"));

    assert_eq!(vec![(0, 1), (2, 3)], spans_of(&regexp, "a\na"));
}

#[test]
fn should_assert_word_boundaries() {
    // \ba
    let terms = vec![Term::Anchor(Anchor::WordBoundary), character('a')];
    let regexp = compile(&pattern(terms, 0), Flags::default());

    assert_eq!(Some((0, 1)), span_of(&regexp, "a"));
    assert_eq!(Some((2, 3)), span_of(&regexp, "x a"));
    assert_eq!(None, span_of(&regexp, "xa"));
}

#[test]
fn should_iterate_adjacent_matches_under_global_rules() {
    let regexp = compile(&pattern(literal("a"), 0), Flags::default());

    assert_eq!(vec![(0, 1), (1, 2), (2, 3)], spans_of(&regexp, "aaa"));
}

#[test]
fn should_terminate_global_iteration_after_a_zero_width_match() {
    // a* globally over a subject it never consumes from
    let terms = vec![Term::quantified(
        Atom::Character('a' as u32),
        Quantifier::eager(QuantifierPrefix::ZeroOrMore),
    )];
    let regexp = compile(&pattern(terms, 0), Flags::default());

    assert_eq!(vec![(0, 0)], spans_of(&regexp, "b"));
}

#[test]
fn should_match_the_complement_of_an_inverted_class() {
    // [^a-c]
    let terms = vec![Term::atom(Atom::CharacterClass(CharacterClass::new(
        true,
        vec![ClassMember::Range('a' as u32, 'c' as u32)],
    )))];
    let regexp = compile(&pattern(terms, 0), Flags::default());

    assert_eq!(Some((3, 4)), span_of(&regexp, "abcd"));
    assert_eq!(None, span_of(&regexp, "abc"));
}

#[test]
fn should_resolve_class_escapes_inside_character_classes() {
    // [\d_]
    let terms = vec![Term::atom(Atom::CharacterClass(CharacterClass::new(
        false,
        vec![
            ClassMember::Escape(ClassEscape::Digit),
            ClassMember::Single('_' as u32),
        ],
    )))];
    let regexp = compile(&pattern(terms, 0), Flags::default());

    assert_eq!(Some((1, 2)), span_of(&regexp, "a5"));
    assert_eq!(Some((1, 2)), span_of(&regexp, "a_"));
    assert_eq!(None, span_of(&regexp, "ab"));
}

#[test]
fn should_exclude_line_terminators_from_dot_without_the_dot_all_flag() {
    let terms = vec![Term::atom(Atom::Any)];
    let plain = compile(&pattern(terms, 0), Flags::default());

    let terms = vec![Term::atom(Atom::Any)];
    let dot_all = compile(&pattern(terms, 0), Flags::parse("s"));

    assert_eq!(None, span_of(&plain, "\n"));
    assert_eq!(Some((0, 1)), span_of(&dot_all, "\n"));
}

#[test]
fn should_index_by_code_units_without_the_unicode_flag() {
    // . over an astral symbol spans one code point or two code units
    let terms = vec![Term::atom(Atom::Any)];
    let unicode = compile(&pattern(terms, 0), Flags::parse("u"));

    let terms = vec![Term::atom(Atom::Any)];
    let units = compile(&pattern(terms, 0), Flags::default());

    assert_eq!(Some((0, 1)), span_of(&unicode, "\u{1F600}"));
    assert_eq!(Some((0, 1)), span_of(&units, "\u{1F600}"));
    assert_eq!(vec![(0, 1)], spans_of(&unicode, "\u{1F600}"));
    assert_eq!(vec![(0, 1), (1, 2)], spans_of(&units, "\u{1F600}"));
}

#[test]
fn should_match_property_escapes_through_host_supplied_tables() {
    struct StubTables;

    impl UnicodeTables for StubTables {
        fn ranges(&self, key: &str) -> Option<Vec<CodePointRange>> {
            match key {
                "General_Category/Lu" => Some(vec![CodePointRange::new(0x41, 0x5A)]),
                "Binary_Property/Alphabetic" => Some(vec![
                    CodePointRange::new(0x41, 0x5A),
                    CodePointRange::new(0x61, 0x7A),
                ]),
                _ => None,
            }
        }
    }

    // \p{Lu} resolves as a General_Category value
    let terms = vec![Term::atom(Atom::Escape(AtomEscape::Class(
        ClassEscape::Property {
            negated: false,
            expression: PropertyExpression::Lone("Lu".to_string()),
        },
    )))];
    let upper = Regexp::new(&pattern(terms, 0), Flags::parse("u"), &StubTables)
        .unwrap_or_else(|e| panic!("construction failed: {}", e));

    // \p{Alphabetic} falls back to a binary property lookup
    let terms = vec![Term::atom(Atom::Escape(AtomEscape::Class(
        ClassEscape::Property {
            negated: false,
            expression: PropertyExpression::Lone("Alphabetic".to_string()),
        },
    )))];
    let alphabetic = Regexp::new(&pattern(terms, 0), Flags::parse("u"), &StubTables)
        .unwrap_or_else(|e| panic!("construction failed: {}", e));

    assert_eq!(Some((1, 2)), span_of(&upper, "aB"));
    assert_eq!(Some((0, 1)), span_of(&alphabetic, "aB"));
}

#[test]
fn should_drive_a_compiled_program_through_the_interpreter_directly() {
    use regexp_runtime::Interpreter;

    // a(b)
    let terms = vec![character('a'), capturing(0, vec![character('b')])];
    let regexp = compile(&pattern(terms, 1), Flags::default());
    let input = regexp.encode("ab");

    let slots = Interpreter::new(regexp.program(), &input, 0)
        .find_next_match()
        .unwrap_or_else(|e| panic!("execution failed: {}", e));

    assert_eq!(Some((0, 2)), slots.as_ref().and_then(|s| s.group(0)));
    assert_eq!(Some((1, 2)), slots.as_ref().and_then(|s| s.group(1)));
}

#[test]
fn should_prefer_the_leftmost_alternative_end_to_end() {
    // ab|a
    let pattern = Pattern::new(
        Disjunction(vec![Alternative(literal("ab")), Alternative(literal("a"))]),
        0,
    );
    let regexp = compile(&pattern, Flags::default());

    assert_eq!(Some((0, 2)), span_of(&regexp, "ab"));
    assert_eq!(Some((0, 1)), span_of(&regexp, "ac"));
}

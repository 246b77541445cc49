use std::io::{self, BufRead};

use regexp_compiler::ast::{Alternative, Atom, Disjunction, Pattern, Quantifier, QuantifierPrefix, Term};
use regexp_compiler::unicode::NoUnicodeTables;
use regexp_compiler::{Flags, Regexp};

const USAGE: &str = "re [--debug] [FLAGS]\n\nfilters stdin to lines matching the built-in pattern `a+b`";

// pattern trees normally arrive from a host-side parser; the example builds
// the tree for `a+b` by hand
fn example_pattern() -> Pattern {
    Pattern::new(
        Disjunction(vec![Alternative(vec![
            Term::quantified(
                Atom::Character('a' as u32),
                Quantifier::eager(QuantifierPrefix::OneOrMore),
            ),
            Term::atom(Atom::Character('b' as u32)),
        ])]),
        0,
    )
}

fn main() -> Result<(), String> {
    let (debug, args) = std::env::args()
        .skip(1)
        .fold((false, vec![]), |(debug, mut args), arg| {
            if arg == "--debug" || arg == "-d" {
                (true, args)
            } else {
                args.push(arg);
                (debug, args)
            }
        });

    let flags = match args.len() {
        0 => Ok(Flags::default()),
        1 => Ok(Flags::parse(&args[0])),
        _ => Err(USAGE.to_string()),
    }?;

    let regexp =
        Regexp::new(&example_pattern(), flags, &NoUnicodeTables).map_err(|e| e.to_string())?;

    if debug {
        println!(
            "DEBUG
--------
{}--------
",
            regexp.program()
        )
    }

    for line in io::stdin().lock().lines() {
        match line {
            Ok(line) => match regexp.find(&line) {
                Ok(Some(_)) => println!("{}", line),
                Ok(None) => continue,
                Err(e) => return Err(e.to_string()),
            },
            Err(e) => return Err(format!("{}", e)),
        }
    }

    Ok(())
}

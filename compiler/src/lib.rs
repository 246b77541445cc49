//! Compiles regexp pattern trees into instruction programs for the paired
//! runtime crate, and wraps the two behind a string-subject match interface.
//!
//! # Example
//!
//! ```
//! use regexp_compiler::ast::{Alternative, Atom, Disjunction, Pattern, Term};
//! use regexp_compiler::unicode::NoUnicodeTables;
//! use regexp_compiler::{Flags, Regexp};
//!
//! // the tree for the pattern `ab`
//! let pattern = Pattern::new(
//!     Disjunction(vec![Alternative(vec![
//!         Term::atom(Atom::Character('a' as u32)),
//!         Term::atom(Atom::Character('b' as u32)),
//!     ])]),
//!     0,
//! );
//!
//! let regexp = Regexp::new(&pattern, Flags::default(), &NoUnicodeTables)?;
//! let found = regexp.find("xxab")?.map(|m| (m.start, m.end));
//! assert_eq!(Some((2, 4)), found);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ast;
pub mod compiler;
pub mod matcher;
pub mod range_set;
pub mod unicode;

pub use compiler::{compile, ConstructionError, Flags};
pub use matcher::{CaptureGroup, Match, Regexp};

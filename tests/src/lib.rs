//! End-to-end pattern matching coverage across the compiler and runtime
//! crates.

#[cfg(test)]
mod pattern_matching;

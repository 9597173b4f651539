//! Answer-string generation.
//!
//! Builds the ground-truth text from a character-class policy.

use rand::Rng;

const DIGITS: &[u8] = b"0123456789";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Curated alphabet excluding visually confusable characters such as
/// 0/O, 1/l/I, 2/Z, 6/b and u/v.
const UNAMBIGUOUS: &[u8] = b"34578acdefghjkmnpqstwxyABCDEFGHJKMNPQRSVWXY";

/// Character-class policy an answer string is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Decimal digits only.
    Digits,
    /// Lowercase ASCII letters only.
    Lower,
    /// Uppercase ASCII letters only.
    Upper,
    /// Digits, lowercase and uppercase, re-rolled per character.
    Mixed,
    /// Fixed alphabet with confusable characters removed; overrides any
    /// per-character class roll.
    Unambiguous,
}

/// Builds an answer string of exactly `count` characters under `class`.
pub fn build(rng: &mut impl Rng, count: usize, class: CharClass) -> String {
    (0..count)
        .map(|_| {
            let table = match class {
                CharClass::Digits => DIGITS,
                CharClass::Lower => LOWER,
                CharClass::Upper => UPPER,
                CharClass::Mixed => match rng.random_range(0..3) {
                    0 => DIGITS,
                    1 => LOWER,
                    _ => UPPER,
                },
                CharClass::Unambiguous => UNAMBIGUOUS,
            };
            char::from(table[rng.random_range(0..table.len())])
        })
        .collect()
}

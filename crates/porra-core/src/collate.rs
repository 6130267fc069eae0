// Spanish-locale string ordering for team and participant names.
//
// Comparison is layered the way a locale collator does it. Every character is
// canonically decomposed (NFD); the base letter gives the primary weight and
// the combining marks give the accent level, so "Š" sorts with "s" and "ğ"
// with "g". Ñ is kept as its own letter between n and o. Punctuation and
// spaces sort before digits, digits before letters. Ties are broken by
// accents, then by case (lowercase first), then by code point so that
// distinct names never compare equal.

use std::cmp::Ordering;

use unicode_normalization::char::{decompose_canonical, is_combining_mark};

/// Primary class: punctuation, symbols and spaces, then digits, then letters.
const CLASS_VARIABLE: u8 = 0;
const CLASS_DIGIT: u8 = 1;
const CLASS_LETTER: u8 = 2;

/// Collation element for one base character.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    primary: (u8, u32),
    /// Combining marks (as code points) attached to the base character.
    accents: Vec<u32>,
    upper: bool,
}

/// Letters without a canonical decomposition that still read as an accented
/// form of a Latin base letter.
fn fold_letter(c: char) -> Option<char> {
    match c {
        'ł' => Some('l'),
        'ø' => Some('o'),
        'đ' | 'ð' => Some('d'),
        'ħ' => Some('h'),
        'ı' => Some('i'),
        'ŧ' => Some('t'),
        _ => None,
    }
}

fn primary_of(base: char) -> (u8, u32) {
    if base.is_alphabetic() {
        (CLASS_LETTER, u32::from(base) * 2)
    } else if base.is_numeric() {
        (CLASS_DIGIT, u32::from(base))
    } else {
        (CLASS_VARIABLE, u32::from(base))
    }
}

fn elements(s: &str) -> Vec<Element> {
    let mut out: Vec<Element> = Vec::new();
    for c in s.chars() {
        let upper = c.is_uppercase();
        let lower = c.to_lowercase().next().unwrap_or(c);

        if lower == 'ñ' {
            // Spread primaries so ñ can slot in right after n.
            out.push(Element {
                primary: (CLASS_LETTER, u32::from('n') * 2 + 1),
                accents: Vec::new(),
                upper,
            });
            continue;
        }

        if let Some(base) = fold_letter(lower) {
            out.push(Element {
                primary: primary_of(base),
                accents: vec![u32::from(lower)],
                upper,
            });
            continue;
        }

        let mut base: Option<char> = None;
        let mut accents = Vec::new();
        decompose_canonical(lower, |d| {
            if base.is_none() && !is_combining_mark(d) {
                base = Some(d);
            } else {
                accents.push(u32::from(d));
            }
        });

        match base {
            Some(base) => out.push(Element {
                primary: primary_of(base),
                accents,
                upper,
            }),
            // A bare combining mark accents the preceding character.
            None => match out.last_mut() {
                Some(prev) => prev.accents.extend(accents),
                None => out.push(Element {
                    primary: primary_of(lower),
                    accents: Vec::new(),
                    upper,
                }),
            },
        }
    }
    out
}

/// Compare two display names in Spanish collation order.
pub fn compare(a: &str, b: &str) -> Ordering {
    let left = elements(a);
    let right = elements(b);

    let primary = left
        .iter()
        .map(|e| e.primary)
        .cmp(right.iter().map(|e| e.primary));
    primary
        .then_with(|| {
            left.iter()
                .map(|e| &e.accents)
                .cmp(right.iter().map(|e| &e.accents))
        })
        .then_with(|| left.iter().map(|e| e.upper).cmp(right.iter().map(|e| e.upper)))
        .then_with(|| a.cmp(b))
}

//! Dice notation: `"2d6 + 1d20 - 1 @ 3 4 17"`.
//!
//! Parsing never fails. Tokens that make no sense set `error` and are
//! skipped; everything else is still collected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::die::DieType;

/// Upper bound on the count of a single `NdX` term.
pub const MAX_TERM_COUNT: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollNotation {
    /// Dice in the order they were written, one entry per die.
    pub die_set: Vec<DieType>,
    pub constant: i32,
    /// Externally supplied results, one per die, given after `@`.
    pub requested_results: Option<Vec<i32>>,
    /// Set when any token could not be understood.
    pub error: bool,
}

impl RollNotation {
    pub fn is_empty(&self) -> bool {
        self.die_set.is_empty()
    }

    /// Dice grouped by type in first-seen order.
    pub fn grouped(&self) -> Vec<(DieType, usize)> {
        let mut groups: Vec<(DieType, usize)> = Vec::new();
        for &die in &self.die_set {
            match groups.iter_mut().find(|(d, _)| *d == die) {
                Some((_, count)) => *count += 1,
                None => groups.push((die, 1)),
            }
        }
        groups
    }

    /// Consecutive runs of the same die type, in written order.
    pub fn runs(&self) -> Vec<(DieType, usize)> {
        let mut runs: Vec<(DieType, usize)> = Vec::new();
        for &die in &self.die_set {
            match runs.last_mut() {
                Some((last, count)) if *last == die => *count += 1,
                _ => runs.push((die, 1)),
            }
        }
        runs
    }
}

impl fmt::Display for RollNotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stringify(self))
    }
}

/// Parse a roll expression.
pub fn parse(notation: &str) -> RollNotation {
    let mut out = RollNotation::default();
    let (expr, results) = match notation.split_once('@') {
        Some((expr, results)) => (expr, Some(results)),
        None => (notation, None),
    };

    let compact: String = expr
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if !compact.is_empty() {
        for (negative, token) in signed_tokens(&compact) {
            if !parse_term(&mut out, negative, token) {
                out.error = true;
            }
        }
    }

    if let Some(results) = results {
        let mut requested = Vec::new();
        for piece in results
            .split(|c: char| !(c.is_ascii_digit() || c == '-'))
            .filter(|s| !s.is_empty())
        {
            match piece.parse::<i32>() {
                Ok(value) => requested.push(value),
                Err(_) => out.error = true,
            }
        }
        if !requested.is_empty() {
            out.requested_results = Some(requested);
        }
    }
    out
}

/// Split `a+b-c` into `(false, "a"), (false, "b"), (true, "c")`. A sign
/// with nothing after it yields an empty token.
fn signed_tokens(expr: &str) -> Vec<(bool, &str)> {
    let mut tokens = Vec::new();
    let mut negative = false;
    let mut start = 0;
    for (i, c) in expr.char_indices() {
        if c == '+' || c == '-' {
            if i > 0 {
                tokens.push((negative, &expr[start..i]));
            }
            negative = c == '-';
            start = i + 1;
        }
    }
    tokens.push((negative, &expr[start..]));
    tokens
}

/// Apply one term; `false` if it is malformed.
fn parse_term(out: &mut RollNotation, negative: bool, token: &str) -> bool {
    if let Some((count, sides)) = token.split_once('d') {
        if negative {
            return false;
        }
        let count = if count.is_empty() {
            1
        } else {
            match count.parse::<u32>() {
                Ok(n) if n <= MAX_TERM_COUNT => n,
                _ => return false,
            }
        };
        let Some(die) = sides.parse::<u32>().ok().and_then(DieType::from_sides) else {
            return false;
        };
        out.die_set
            .extend(std::iter::repeat(die).take(count as usize));
        return true;
    }

    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let Ok(value) = token.parse::<i32>() else {
        return false;
    };
    let value = if negative { -value } else { value };
    match out.constant.checked_add(value) {
        Some(sum) => {
            out.constant = sum;
            true
        }
        None => false,
    }
}

/// Canonical text form: `2d6 + 1d20 + 3 @ 4 2 19`.
///
/// Requested results pair up with dice by position, so when they are
/// present only adjacent dice of one type are merged and the written order
/// is kept.
pub fn stringify(notation: &RollNotation) -> String {
    let requested = notation
        .requested_results
        .as_deref()
        .filter(|r| !r.is_empty());
    let terms = match requested {
        Some(_) => notation.runs(),
        None => notation.grouped(),
    };
    let mut out = terms
        .into_iter()
        .map(|(die, count)| format!("{count}{die}"))
        .collect::<Vec<_>>()
        .join(" + ");

    if notation.constant != 0 {
        let magnitude = notation.constant.unsigned_abs();
        if out.is_empty() {
            out = notation.constant.to_string();
        } else if notation.constant > 0 {
            out.push_str(&format!(" + {magnitude}"));
        } else {
            out.push_str(&format!(" - {magnitude}"));
        }
    }

    if let Some(results) = requested {
        let results = results
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        if out.is_empty() {
            out = format!("@ {results}");
        } else {
            out.push_str(&format!(" @ {results}"));
        }
    }
    out
}

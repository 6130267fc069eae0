// Scalar resolvers: raw text/number coercion into typed scores and signs.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A final (or predicted) score. Goal counts are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    #[serde(deserialize_with = "de_goals")]
    pub home: u32,
    #[serde(deserialize_with = "de_goals")]
    pub away: u32,
}

impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Score { home, away }
    }

    pub fn sign(&self) -> Sign {
        Sign::of(self.home, self.away)
    }

    /// Signed goal difference from the home side's point of view.
    pub fn goal_difference(&self) -> i64 {
        i64::from(self.home) - i64::from(self.away)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// Categorical match result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    HomeWin,
    Draw,
    AwayWin,
}

impl Sign {
    pub fn of(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Sign::HomeWin,
            std::cmp::Ordering::Less => Sign::AwayWin,
            std::cmp::Ordering::Equal => Sign::Draw,
        }
    }

    /// Quiniela-style symbol: "1", "X" or "2".
    pub fn symbol(&self) -> &'static str {
        match self {
            Sign::HomeWin => "1",
            Sign::Draw => "X",
            Sign::AwayWin => "2",
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Parse a user-entered goal count. Only trimmed runs of ASCII digits are
/// accepted; blank or anything else yields `None`.
pub fn safe_int(raw: &str) -> Option<u32> {
    let s = raw.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoreInputError {
    #[error("enter both goal counts, or leave both empty to clear the result")]
    Incomplete,
}

/// Resolve a pair of raw score fields.
///
/// Both empty means "clear" (`Ok(None)`), both valid gives an outcome, and a
/// half-filled pair is rejected. Non-numeric text counts as empty.
pub fn parse_score_input(home: &str, away: &str) -> Result<Option<Score>, ScoreInputError> {
    match (safe_int(home), safe_int(away)) {
        (Some(h), Some(a)) => Ok(Some(Score::new(h, a))),
        (None, None) => Ok(None),
        _ => Err(ScoreInputError::Incomplete),
    }
}

// ---------------------------------------------------------------------------
// Lenient serde coercions for the base dataset
// ---------------------------------------------------------------------------

fn value_to_u32(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => safe_int(s),
        _ => None,
    }
}

/// Goal count: a non-negative integer, optionally written as a digit string.
pub fn de_goals<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    value_to_u32(&v).ok_or_else(|| de::Error::custom(format!("invalid goal count: {v}")))
}

/// Rule points: missing or null counts as zero, numeric strings are accepted.
pub fn de_points<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(0);
    }
    value_to_u32(&v).ok_or_else(|| de::Error::custom(format!("invalid points value: {v}")))
}

/// Identifier or lookup key given either as a string or as a number.
pub fn de_key<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected string or number key, got {other}"))),
    }
}

/// Optional integer such as a matchday; anything unparseable becomes `None`.
pub fn de_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(value_to_u32(&v))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn safe_int_accepts_only_digits() {
        assert_eq!(safe_int("3"), Some(3));
        assert_eq!(safe_int("  12 "), Some(12));
        assert_eq!(safe_int(""), None);
        assert_eq!(safe_int("   "), None);
        assert_eq!(safe_int("-1"), None);
        assert_eq!(safe_int("1.5"), None);
        assert_eq!(safe_int("2a"), None);
    }

    #[test]
    fn sign_from_scores() {
        assert_eq!(Sign::of(2, 1), Sign::HomeWin);
        assert_eq!(Sign::of(0, 3), Sign::AwayWin);
        assert_eq!(Sign::of(1, 1), Sign::Draw);
        assert_eq!(Score::new(4, 0).sign().to_string(), "1");
        assert_eq!(Score::new(0, 0).sign().to_string(), "X");
        assert_eq!(Score::new(0, 2).sign().to_string(), "2");
    }

    #[test]
    fn goal_difference_is_signed() {
        assert_eq!(Score::new(1, 3).goal_difference(), -2);
        assert_eq!(Score::new(3, 1).goal_difference(), 2);
    }

    #[test]
    fn score_input_both_or_neither() {
        assert_eq!(parse_score_input("2", "0"), Ok(Some(Score::new(2, 0))));
        assert_eq!(parse_score_input("", " "), Ok(None));
        assert_eq!(parse_score_input("2", ""), Err(ScoreInputError::Incomplete));
        assert_eq!(parse_score_input("x", "1"), Err(ScoreInputError::Incomplete));
    }

    #[test]
    fn score_deserializes_numeric_strings() {
        let s: Score = serde_json::from_value(json!({"home": "2", "away": 1})).unwrap();
        assert_eq!(s, Score::new(2, 1));
    }

    #[test]
    fn score_rejects_negative_goals() {
        let r: Result<Score, _> = serde_json::from_value(json!({"home": -1, "away": 1}));
        assert!(r.is_err());
    }

    #[test]
    fn score_rejects_missing_side() {
        let r: Result<Score, _> = serde_json::from_value(json!({"home": 1}));
        assert!(r.is_err());
    }
}

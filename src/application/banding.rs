//! Score-banded closing comments.
//!
//! Authors attach a `finalcomment` object to an exercise payload:
//!
//! ```json
//! { "common": "Thanks for trying!", "49": "Keep practising.", "100": "Great job." }
//! ```
//!
//! Numeric keys are upper bounds. The lowest bound that is still greater than or
//! equal to the score selects the comment; `common` is always shown first.

use serde_json::{Map, Value};

const COMMON_KEY: &str = "common";
const LINE_BREAK: &str = "<br>";

/// Ordered band table derived from a `finalcomment` mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBands {
    common: Option<String>,
    bands: Vec<(i64, String)>,
}

impl ScoreBands {
    pub fn from_comment_payload(payload: &Map<String, Value>) -> Self {
        let common = payload
            .get(COMMON_KEY)
            .filter(|value| is_truthy(value))
            .map(value_text);

        // Map keys iterate in sorted order and the sort is stable, so equal
        // thresholds resolve to the lexicographically first key.
        let mut bands: Vec<(i64, String)> = payload
            .iter()
            .filter_map(|(key, value)| parse_threshold(key).map(|limit| (limit, value_text(value))))
            .collect();
        bands.sort_by_key(|(limit, _)| *limit);

        Self { common, bands }
    }

    /// Comment HTML for `score`.
    pub fn comment_for(&self, score: f64) -> String {
        let mut html = String::new();
        if let Some(common) = &self.common {
            html.push_str(common);
            html.push_str(LINE_BREAK);
        }

        if let Some((_, text)) = self.bands.iter().find(|(limit, _)| score <= *limit as f64) {
            html.push_str(text);
        }

        html
    }

    pub fn thresholds(&self) -> impl Iterator<Item = i64> + '_ {
        self.bands.iter().map(|(limit, _)| *limit)
    }
}

/// Select the closing comment for `score`. An absent payload yields an empty
/// string.
pub fn final_comment(score: f64, payload: Option<&Map<String, Value>>) -> String {
    payload
        .map(|payload| ScoreBands::from_comment_payload(payload).comment_for(score))
        .unwrap_or_default()
}

/// Leading-integer parse: optional surrounding whitespace and sign, then at
/// least one ASCII digit. Anything after the digits is ignored.
fn parse_threshold(key: &str) -> Option<i64> {
    let trimmed = key.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn comments(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn absent_payload_yields_empty_comment() {
        assert_eq!(final_comment(50.0, None), "");
    }

    #[test]
    fn smallest_threshold_at_or_above_score_wins() {
        let payload = comments(json!({ "common": "C", "50": "B", "100": "A" }));
        assert_eq!(final_comment(72.0, Some(&payload)), "C<br>A");
        assert_eq!(final_comment(50.0, Some(&payload)), "C<br>B");
        assert_eq!(final_comment(0.0, Some(&payload)), "C<br>B");
    }

    #[test]
    fn score_above_every_threshold_gets_no_band_text() {
        let payload = comments(json!({ "90": "x" }));
        assert_eq!(final_comment(100.0, Some(&payload)), "");

        let with_common = comments(json!({ "common": "C", "90": "x" }));
        assert_eq!(final_comment(100.0, Some(&with_common)), "C<br>");
    }

    #[test]
    fn only_common_is_returned_for_any_score() {
        let payload = comments(json!({ "common": "Always" }));
        for score in [0.0, 42.0, 100.0] {
            assert_eq!(final_comment(score, Some(&payload)), "Always<br>");
        }
    }

    #[test]
    fn thresholds_sort_numerically_not_lexically() {
        let payload = comments(json!({ "100": "A", "9": "low", "20": "mid" }));
        let bands = ScoreBands::from_comment_payload(&payload);
        assert_eq!(bands.thresholds().collect::<Vec<_>>(), vec![9, 20, 100]);
        assert_eq!(bands.comment_for(10.0), "mid");
    }

    #[test]
    fn non_numeric_keys_are_ignored_for_thresholds() {
        let payload = comments(json!({ "common": "C", "extra": "nope", "60": "pass" }));
        let bands = ScoreBands::from_comment_payload(&payload);
        assert_eq!(bands.thresholds().collect::<Vec<_>>(), vec![60]);
    }

    #[test]
    fn leading_integer_keys_count_as_thresholds() {
        assert_eq!(parse_threshold("50%"), Some(50));
        assert_eq!(parse_threshold(" 7"), Some(7));
        assert_eq!(parse_threshold("-3"), Some(-3));
        assert_eq!(parse_threshold("abc"), None);
        assert_eq!(parse_threshold("-"), None);
    }

    #[test]
    fn empty_common_is_not_shown() {
        let payload = comments(json!({ "common": "", "100": "A" }));
        assert_eq!(final_comment(10.0, Some(&payload)), "A");
    }

    #[test]
    fn every_score_selects_the_smallest_qualifying_threshold() {
        let payload = comments(json!({ "25": "q1", "50": "q2", "75": "q3", "100": "q4" }));
        for score in 0..=100 {
            let expected = match score {
                0..=25 => "q1",
                26..=50 => "q2",
                51..=75 => "q3",
                _ => "q4",
            };
            assert_eq!(final_comment(f64::from(score), Some(&payload)), expected);
        }
    }
}

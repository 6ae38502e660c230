//! Exercise payload: configuration and answer-key data shipped to the browser.
//!
//! The payload is merged from an optional author-written JSON file and data
//! generated from the parsed exercise. Only the fields this crate interprets
//! are typed; everything else is carried through untouched in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::error::ExerciseError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExercisePayload {
    /// Score-banded closing comments, keyed by threshold plus optional `common`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalcomment: Option<Map<String, Value>>,
    /// Learner answers, only present on per-request copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Value>,
    /// Content-type specific data.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExercisePayload {
    pub fn from_map(map: Map<String, Value>) -> Result<Self, ExerciseError> {
        serde_json::from_value(Value::Object(map))
            .map_err(|err| ExerciseError::payload_merge(format!("unexpected payload shape: {err}")))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Merge the authored payload with the generated one.
///
/// The authored document must be a JSON object. Generated keys win on
/// conflict; each authored value that gets replaced is logged.
pub fn merge_payload(
    authored: Value,
    generated: Map<String, Value>,
) -> Result<Map<String, Value>, ExerciseError> {
    let Value::Object(mut merged) = authored else {
        return Err(ExerciseError::payload_merge(
            "authored payload must be a JSON object",
        ));
    };

    for (key, value) in generated {
        if let Some(previous) = merged.insert(key.clone(), value)
            && merged.get(&key) != Some(&previous)
        {
            warn!(
                target = "domain::payload",
                key = %key,
                "Generated payload replaced an authored value"
            );
        }
    }

    Ok(merged)
}

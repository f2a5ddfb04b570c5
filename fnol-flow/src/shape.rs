use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::normalize::{NormalizedAnswers, NormalizedValue};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub value: Value,
}

/// UI envelope for one answer: checkbox answers become one envelope per
/// selected value, everything else a single envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ShapedAnswer {
    Single(Envelope),
    Multiple(Vec<Envelope>),
}

pub type ShapedAnswers = BTreeMap<String, ShapedAnswer>;

pub fn shape_answer(value: &NormalizedValue) -> ShapedAnswer {
    match value {
        NormalizedValue::List(items) => ShapedAnswer::Multiple(
            items
                .iter()
                .map(|item| Envelope {
                    value: Value::String(item.clone()),
                })
                .collect(),
        ),
        other => ShapedAnswer::Single(Envelope {
            value: other.to_json(),
        }),
    }
}

pub fn shape(answers: &NormalizedAnswers) -> ShapedAnswers {
    answers
        .iter()
        .map(|(id, value)| (id.clone(), shape_answer(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::QuestionCatalog, normalize::normalize, orchestrator::RawAnswerMap};
    use serde_json::json;

    #[test]
    fn envelopes_follow_element_type() {
        let catalog = QuestionCatalog::auto_policy().unwrap();
        let raw: RawAnswerMap = [
            ("eventType".to_string(), Some("collision".to_string())),
            ("wereInjuries".to_string(), Some("true".to_string())),
            ("injuredParty".to_string(), Some("driver-1, other".to_string())),
            ("numOtherVehicles".to_string(), Some("0".to_string())),
        ]
        .into_iter()
        .collect();

        let shaped = serde_json::to_value(shape(&normalize(&catalog, &raw))).unwrap();

        assert_eq!(shaped["eventType"], json!({"value": "collision"}));
        assert_eq!(shaped["wereInjuries"], json!({"value": true}));
        assert_eq!(shaped["numOtherVehicles"], json!({"value": "0"}));
        assert_eq!(
            shaped["injuredParty"],
            json!([{"value": "driver-1"}, {"value": "other"}])
        );
        assert_eq!(shaped["otherDriverFirstName"], json!({"value": null}));
        assert_eq!(shaped["wasVehicleTowed"], json!({"value": null}));
    }

    #[test]
    fn empty_checkbox_stays_empty() {
        assert_eq!(
            shape_answer(&NormalizedValue::List(vec![])),
            ShapedAnswer::Multiple(vec![])
        );
    }
}

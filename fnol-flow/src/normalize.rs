use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{catalog::QuestionCatalog, orchestrator::RawAnswerMap, question::ElementType};

/// A raw answer coerced to the type its question's element type implies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Flag(Option<bool>),
    List(Vec<String>),
    Numeric(Option<String>),
    Text(Option<String>),
}

impl NormalizedValue {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            NormalizedValue::Flag(None)
                | NormalizedValue::Numeric(None)
                | NormalizedValue::Text(None)
        )
    }

    pub fn to_json(&self) -> Value {
        match self {
            NormalizedValue::Flag(flag) => flag.map(Value::Bool).unwrap_or(Value::Null),
            NormalizedValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            NormalizedValue::Numeric(s) | NormalizedValue::Text(s) => {
                s.clone().map(Value::String).unwrap_or(Value::Null)
            }
        }
    }
}

fn is_null_literal(raw: &str) -> bool {
    raw.trim().eq_ignore_ascii_case("null")
}

/// Coerce one raw answer. Total: anything unrecognised becomes null/empty.
pub fn normalize_answer(element_type: ElementType, raw: Option<&str>) -> NormalizedValue {
    match element_type {
        ElementType::YesOrNo | ElementType::YesOrNoOrUnknown => {
            NormalizedValue::Flag(raw.and_then(|s| match s.trim() {
                t if t.eq_ignore_ascii_case("true") => Some(true),
                t if t.eq_ignore_ascii_case("false") => Some(false),
                _ => None,
            }))
        }
        ElementType::Checkbox => {
            let items = match raw.map(str::trim) {
                None => Vec::new(),
                Some(s) if s.is_empty() || s.eq_ignore_ascii_case("none") || is_null_literal(s) => {
                    Vec::new()
                }
                Some(s) => s
                    .split(',')
                    .map(str::trim)
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect(),
            };
            NormalizedValue::List(items)
        }
        ElementType::Numeric => NormalizedValue::Numeric(
            raw.filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
                .map(str::to_string),
        ),
        ElementType::Select
        | ElementType::Radio
        | ElementType::Input
        | ElementType::InputPhone
        | ElementType::Infobox => {
            NormalizedValue::Text(raw.filter(|s| !is_null_literal(s)).map(str::to_string))
        }
    }
}

/// One typed value per catalog question
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct NormalizedAnswers {
    values: BTreeMap<String, NormalizedValue>,
}

impl NormalizedAnswers {
    pub fn get(&self, question_id: &str) -> Option<&NormalizedValue> {
        self.values.get(question_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NormalizedValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Normalize a raw answer map against the catalog.
///
/// Ids not in the catalog are dropped; catalog questions missing from `raw`
/// get their type's null/empty value.
pub fn normalize(catalog: &QuestionCatalog, raw: &RawAnswerMap) -> NormalizedAnswers {
    let values = catalog
        .iter()
        .map(|question| {
            let answer = raw.get(&question.id).and_then(|a| a.as_deref());
            (
                question.id.clone(),
                normalize_answer(question.element_type, answer),
            )
        })
        .collect();

    NormalizedAnswers { values }
}

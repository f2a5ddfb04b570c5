//! Port to the external classification/inference service.
//!
//! The core only depends on [`InferenceGateway`]; adapters for concrete LLM
//! providers live with the binary. The request types below are what an
//! adapter sends over the wire, and the `parse_*` helpers turn a model's
//! text reply back into the shapes the core expects.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::GatewayError,
    event::EventType,
    question::{ElementType, Question},
};

#[derive(Debug, Clone, Serialize)]
pub struct EventTypeDefinition {
    pub value: &'static str,
    pub label: &'static str,
    pub definition: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationRequest {
    pub description: String,
    pub event_types: Vec<EventTypeDefinition>,
}

impl ClassificationRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            event_types: EventType::ALL
                .iter()
                .map(|e| EventTypeDefinition {
                    value: e.as_str(),
                    label: e.label(),
                    definition: e.definition(),
                })
                .collect(),
        }
    }
}

/// The parts of a question the inference service needs to answer it
#[derive(Debug, Clone, Serialize)]
pub struct QuestionSchema {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub description: Option<String>,
    pub possible_values: Vec<String>,
}

impl From<&Question> for QuestionSchema {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            label: question.label.clone(),
            element_type: question.element_type,
            description: question.description.clone(),
            possible_values: question.possible_values(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerRequest {
    pub description: String,
    pub event_type: EventType,
    pub question: QuestionSchema,
}

#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Classify the description. Returns the provider's raw event type value;
    /// validation against [`EventType`] is the caller's job.
    async fn classify(&self, request: &ClassificationRequest) -> Result<String, GatewayError>;

    /// Answer one question. `None` means the service answered `null`.
    async fn answer(&self, request: &AnswerRequest) -> Result<Option<String>, GatewayError>;
}

#[derive(Deserialize)]
struct ClassificationResponse {
    event_type: String,
}

#[derive(Deserialize)]
struct AnswerResponse {
    answer: Value,
}

/// First complete JSON object in a reply. Text before and after it is ignored,
/// braces in the trailing prose included.
fn json_object(response: &str) -> Option<Value> {
    response.match_indices('{').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&response[start..])
            .into_iter::<Value>()
            .next()
            .and_then(|value| value.ok())
            .filter(Value::is_object)
    })
}

/// Pull the event type out of a classifier reply. Never fails: anything that
/// is not the expected JSON comes back as the trimmed reply itself and is
/// rejected later by [`EventType::parse_or_fallback`].
pub fn parse_classification(response: &str) -> String {
    json_object(response)
        .and_then(|json| serde_json::from_value::<ClassificationResponse>(json).ok())
        .map(|parsed| parsed.event_type)
        .unwrap_or_else(|| {
            debug!(response = %response, "Classifier reply is not JSON");
            response.trim().to_string()
        })
}

/// Pull the answer out of a per-question reply.
///
/// Booleans and numbers are rendered as their literal strings, a list of
/// strings is joined with `", "`, and both JSON `null` and the string
/// `"null"` map to `None`.
pub fn parse_answer(response: &str) -> Result<Option<String>, GatewayError> {
    let json = json_object(response)
        .ok_or_else(|| GatewayError::MalformedResponse(format!("no JSON object in '{response}'")))?;
    let parsed: AnswerResponse = serde_json::from_value(json)
        .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

    match parsed.answer {
        Value::Null => Ok(None),
        Value::String(s) if s.trim() == "null" => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    GatewayError::MalformedResponse(format!("non-string list item {item}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|values| Some(values.join(", "))),
        other => Err(GatewayError::MalformedResponse(format!(
            "unexpected answer {other}"
        ))),
    }
}

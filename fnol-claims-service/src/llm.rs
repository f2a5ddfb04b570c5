use async_trait::async_trait;
use fnol_flow::{
    AnswerRequest, ClassificationRequest, GatewayError, InferenceGateway, parse_answer,
    parse_classification,
};
use rig::{
    agent::Agent,
    client::CompletionClient,
    completion::Prompt,
    providers::openrouter,
};
use tracing::debug;

const CLASSIFICATION_PROMPT: &str = r#"You are an auto insurance claims assistant that classifies First Notice of Loss descriptions.

You will receive JSON with:
- "description": the policyholder's own words
- "event_types": the allowed categories, each with a value, label and definition

Pick the ONE category that best describes the incident and respond with ONLY this JSON:
{
  "event_type": "<value>"
}

Use exactly one of the listed values. If nothing fits, use "other-vehicle-damage".
Do not mix text and JSON in your response.
"#;

const ANSWER_PROMPT: &str = r#"You are an auto insurance claims assistant filling out a First Notice of Loss form.

The policy has only one insured vehicle: "2023-bmw-x1".
The policy has only one named driver: "driver-1".

You will receive JSON with:
- "description": the policyholder's own words
- "event_type": the classified incident category
- "question": the form field to fill (id, label, type, description, possible_values)

Respond with ONLY this JSON:
{
  "answer": "<value>"
}

Rules:
- If "possible_values" is not empty, answer with one of them (for "checkbox", a comma-separated list of them, or "none").
- For "yes-or-no" and "yes-or-no-or-unknown" answer "true" or "false".
- For "numeric" answer digits only, e.g. "0".
- If the description does not tell you, answer "null". Never guess names or phone numbers.
"#;

/// [`InferenceGateway`] backed by an OpenRouter chat model through rig
pub struct RigInferenceGateway {
    client: openrouter::Client,
    model: String,
}

impl RigInferenceGateway {
    pub fn new(api_key: &str, model: impl Into<String>) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
            model: model.into(),
        }
    }

    fn agent(&self, preamble: &str) -> Agent<openrouter::CompletionModel> {
        self.client
            .agent(&self.model)
            .preamble(preamble)
            .temperature(0.0)
            .build()
    }

    async fn prompt(&self, preamble: &str, payload: String) -> Result<String, GatewayError> {
        let agent = self.agent(preamble);
        agent
            .prompt(payload)
            .await
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))
    }
}

fn to_payload(value: &impl serde::Serialize) -> Result<String, GatewayError> {
    serde_json::to_string(value).map_err(|e| GatewayError::RequestFailed(e.to_string()))
}

#[async_trait]
impl InferenceGateway for RigInferenceGateway {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String, GatewayError> {
        let response = self
            .prompt(CLASSIFICATION_PROMPT, to_payload(request)?)
            .await?;
        debug!(response = %response, "Classifier replied");
        Ok(parse_classification(&response))
    }

    async fn answer(&self, request: &AnswerRequest) -> Result<Option<String>, GatewayError> {
        let response = self.prompt(ANSWER_PROMPT, to_payload(request)?).await?;
        debug!(
            question_id = %request.question.id,
            response = %response,
            "Answer model replied"
        );
        parse_answer(&response)
    }
}

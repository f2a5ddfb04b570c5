//! ClaimPipeline – turns one loss description into a pre-filled claim form.
//!
//! ## Steps
//! 1. **Classify** the description into an [`EventType`]. A value the
//!    classifier invents is replaced by [`EventType::FALLBACK`]; a failed or
//!    timed-out call fails the request.
//! 2. **Seed** the [`AnswerContext`] with whatever the caller already knows
//!    plus the classified event type. Known questions are never re-asked.
//! 3. **Resolve in waves**. Each wave asks the orchestrator for every relevant
//!    question that has no answer yet. Answers are folded back into the
//!    context, which can make further questions relevant (e.g.
//!    `whoWasDriving = "other"` unlocks the other driver's details), so the
//!    loop runs until a wave finds nothing new. Each wave answers at least
//!    one new catalog question, so the loop is bounded by the catalog size.
//! 4. **Normalize and shape** the combined answers over the whole catalog.
//!
//! Any failure in step 1 or 3 fails the whole request; no partial form is
//! returned.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::{
    catalog::QuestionCatalog,
    context::AnswerContext,
    dependency::relevant_questions,
    error::{FlowError, GatewayError, Result},
    event::EventType,
    gateway::{ClassificationRequest, InferenceGateway},
    normalize::{normalize, normalize_answer},
    orchestrator::{AnswerOrchestrator, OrchestratorConfig, RawAnswerMap},
    question::{Question, question_ids},
    shape::{ShapedAnswers, shape},
};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub orchestrator: OrchestratorConfig,
    pub classify_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig::default(),
            classify_timeout: Duration::from_secs(30),
        }
    }
}

/// Inbound request: a free-text loss description and optional known answers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LossSubmission {
    pub description: String,
    #[serde(default)]
    pub context: HashMap<String, Value>,
}

impl LossSubmission {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            context: HashMap::new(),
        }
    }

    pub fn with_answer(mut self, question_id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(question_id.into(), value.into());
        self
    }
}

/// The questionnaire plus the best-guess answers for one submission
#[derive(Debug, Clone, Serialize)]
pub struct ClaimForm {
    pub claim_id: String,
    pub event_type: EventType,
    pub questions: Vec<Question>,
    pub answers: ShapedAnswers,
}

#[derive(Clone)]
pub struct ClaimPipeline {
    catalog: Arc<QuestionCatalog>,
    gateway: Arc<dyn InferenceGateway>,
    orchestrator: AnswerOrchestrator,
    classify_timeout: Duration,
}

impl ClaimPipeline {
    pub fn new(
        catalog: Arc<QuestionCatalog>,
        gateway: Arc<dyn InferenceGateway>,
        config: PipelineConfig,
    ) -> Self {
        let orchestrator = AnswerOrchestrator::new(Arc::clone(&gateway), config.orchestrator);
        Self {
            catalog,
            gateway,
            orchestrator,
            classify_timeout: config.classify_timeout,
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    /// Classify a description, substituting the fallback for unknown values.
    pub async fn classify(&self, description: &str) -> Result<EventType> {
        let request = ClassificationRequest::new(description);
        let raw = tokio::time::timeout(self.classify_timeout, self.gateway.classify(&request))
            .await
            .map_err(|_| FlowError::Classification(GatewayError::Timeout))?
            .map_err(FlowError::Classification)?;

        Ok(EventType::parse_or_fallback(&raw))
    }

    pub async fn submit(&self, submission: LossSubmission) -> Result<ClaimForm> {
        let claim_id = Uuid::new_v4().to_string();
        let LossSubmission {
            description,
            context: prior,
        } = submission;

        info!(
            claim_id = %claim_id,
            description_length = description.len(),
            prior_answers = prior.len(),
            "Processing loss submission"
        );

        let mut context: AnswerContext = prior.into_iter().collect();

        let known_event_type = context
            .text(question_ids::EVENT_TYPE)
            .and_then(|raw| raw.parse::<EventType>().ok());
        let event_type = match known_event_type {
            Some(event_type) => {
                info!(
                    claim_id = %claim_id,
                    event_type = %event_type,
                    "Using caller-provided event type"
                );
                event_type
            }
            None => self.classify(&description).await?,
        };
        context.set(question_ids::EVENT_TYPE, event_type.as_str());

        info!(claim_id = %claim_id, event_type = %event_type, "Event type determined");

        let mut raw = self
            .resolve_waves(&claim_id, &description, event_type, &mut context)
            .await?;

        for (id, value) in context.iter() {
            if !raw.contains_key(id) {
                raw.insert(id.clone(), context_literal(value));
            }
        }

        let answers = shape(&normalize(&self.catalog, &raw));

        info!(
            claim_id = %claim_id,
            event_type = %event_type,
            answered = raw.len(),
            "Claim form ready"
        );

        Ok(ClaimForm {
            claim_id,
            event_type,
            questions: self.catalog.questions().to_vec(),
            answers,
        })
    }

    async fn resolve_waves(
        &self,
        claim_id: &str,
        description: &str,
        event_type: EventType,
        context: &mut AnswerContext,
    ) -> Result<RawAnswerMap> {
        let mut raw = RawAnswerMap::new();
        let mut wave = 0usize;

        loop {
            let pending: Vec<&Question> = relevant_questions(&self.catalog, event_type, context)
                .into_iter()
                .filter(|q| !context.contains(&q.id) && !raw.contains_key(&q.id))
                .collect();

            if pending.is_empty() {
                return Ok(raw);
            }

            wave += 1;
            info!(
                claim_id = %claim_id,
                wave,
                pending = pending.len(),
                "Resolving answer wave"
            );

            let answers = self
                .orchestrator
                .resolve(description, event_type, &pending)
                .await?;

            for (id, answer) in answers {
                if let Some(question) = self.catalog.get(&id) {
                    let value = normalize_answer(question.element_type, answer.as_deref());
                    context.set(id.clone(), value.to_json());
                }
                raw.insert(id, answer);
            }
        }
    }
}

/// Render a context value the way the inference service would have answered it.
fn context_literal(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::AnswerRequest;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers from a fixed table and records which questions were asked.
    struct ScriptedGateway {
        event_type: std::result::Result<String, GatewayError>,
        answers: HashMap<&'static str, &'static str>,
        asked: Mutex<Vec<String>>,
        classified: Mutex<usize>,
    }

    impl ScriptedGateway {
        fn new(event_type: &str, answers: &[(&'static str, &'static str)]) -> Self {
            Self {
                event_type: Ok(event_type.to_string()),
                answers: answers.iter().copied().collect(),
                asked: Mutex::new(Vec::new()),
                classified: Mutex::new(0),
            }
        }

        fn asked(&self) -> Vec<String> {
            let mut asked = self.asked.lock().unwrap().clone();
            asked.sort();
            asked
        }
    }

    #[async_trait]
    impl InferenceGateway for ScriptedGateway {
        async fn classify(
            &self,
            _request: &ClassificationRequest,
        ) -> std::result::Result<String, GatewayError> {
            *self.classified.lock().unwrap() += 1;
            self.event_type.clone()
        }

        async fn answer(
            &self,
            request: &AnswerRequest,
        ) -> std::result::Result<Option<String>, GatewayError> {
            let id = request.question.id.clone();
            self.asked.lock().unwrap().push(id.clone());
            match self.answers.get(id.as_str()) {
                Some(&"FAIL") => Err(GatewayError::RequestFailed("boom".into())),
                Some(&"null") | None => Ok(None),
                Some(answer) => Ok(Some(answer.to_string())),
            }
        }
    }

    fn pipeline(gateway: Arc<ScriptedGateway>) -> ClaimPipeline {
        ClaimPipeline::new(
            Arc::new(QuestionCatalog::auto_policy().unwrap()),
            gateway,
            PipelineConfig::default(),
        )
    }

    fn answers_json(form: &ClaimForm) -> Value {
        serde_json::to_value(&form.answers).unwrap()
    }

    #[tokio::test]
    async fn collision_with_other_driver_resolves_dependent_wave() {
        let gateway = Arc::new(ScriptedGateway::new(
            "collision",
            &[
                ("whichVehicleInvolved", "2023-bmw-x1"),
                ("whoWasDriving", "other"),
                ("otherDriverFirstName", "Somchai"),
                ("wasVehicleTowed", "false"),
                ("wereInjuries", "maybe"),
                ("numOtherVehicles", "1"),
            ],
        ));
        let form = pipeline(gateway.clone())
            .submit(LossSubmission::new("My friend was driving my BMW and hit a van"))
            .await
            .unwrap();

        assert_eq!(form.event_type, EventType::Collision);
        assert_eq!(form.questions.len(), 16);
        assert_eq!(
            gateway.asked(),
            vec![
                "numOtherVehicles",
                "otherDriverFirstName",
                "otherDriverLastName",
                "otherDriverPhoneNumber",
                "wasVehicleGlassDamaged",
                "wasVehicleTowed",
                "wereFatalities",
                "wereInjuries",
                "whichVehicleInvolved",
                "whoWasDriving",
            ]
        );

        let answers = answers_json(&form);
        assert_eq!(answers["eventType"], json!({"value": "collision"}));
        assert_eq!(answers["whoWasDriving"], json!({"value": "other"}));
        assert_eq!(answers["otherDriverFirstName"], json!({"value": "Somchai"}));
        assert_eq!(answers["otherDriverLastName"], json!({"value": null}));
        assert_eq!(answers["wasVehicleTowed"], json!({"value": false}));
        assert_eq!(answers["wereInjuries"], json!({"value": null}));
        assert_eq!(answers["numOtherVehicles"], json!({"value": "1"}));
        assert_eq!(answers["injuredParty"], json!([]));
    }

    #[tokio::test]
    async fn prior_answers_are_not_asked_again() {
        let gateway = Arc::new(ScriptedGateway::new("collision", &[("whoWasDriving", "driver-1")]));
        let submission = LossSubmission::new("Someone else drove")
            .with_answer("whoWasDriving", "other")
            .with_answer("wereInjuries", true);

        let form = pipeline(gateway.clone()).submit(submission).await.unwrap();

        let asked = gateway.asked();
        assert!(!asked.contains(&"whoWasDriving".to_string()));
        assert!(!asked.contains(&"wereInjuries".to_string()));
        assert!(asked.contains(&"otherDriverPhoneNumber".to_string()));

        let answers = answers_json(&form);
        assert_eq!(answers["whoWasDriving"], json!({"value": "other"}));
        assert_eq!(answers["wereInjuries"], json!({"value": true}));
    }

    #[tokio::test]
    async fn caller_event_type_skips_classification() {
        let gateway = Arc::new(ScriptedGateway::new("collision", &[]));
        let submission = LossSubmission::new("Hail cracked the windscreen")
            .with_answer("eventType", "damage-caused-by-weather");

        let form = pipeline(gateway.clone()).submit(submission).await.unwrap();

        assert_eq!(form.event_type, EventType::DamageCausedByWeather);
        assert_eq!(*gateway.classified.lock().unwrap(), 0);
        assert!(gateway.asked().contains(&"isVehicleDrivable".to_string()));
    }

    #[tokio::test]
    async fn invalid_classification_uses_fallback() {
        let gateway = Arc::new(ScriptedGateway::new("meteor-strike", &[]));
        let form = pipeline(gateway.clone())
            .submit(LossSubmission::new("A meteor hit my car"))
            .await
            .unwrap();

        assert_eq!(form.event_type, EventType::FALLBACK);
        assert_eq!(gateway.asked(), vec!["isVehicleDrivable", "whichVehicleInvolved"]);
    }

    #[tokio::test]
    async fn classification_failure_is_fatal() {
        let mut gateway = ScriptedGateway::new("collision", &[]);
        gateway.event_type = Err(GatewayError::RequestFailed("401".into()));

        let result = pipeline(Arc::new(gateway))
            .submit(LossSubmission::new("anything"))
            .await;

        assert!(matches!(result, Err(FlowError::Classification(_))));
    }

    struct StalledClassifier;

    #[async_trait]
    impl InferenceGateway for StalledClassifier {
        async fn classify(
            &self,
            _request: &ClassificationRequest,
        ) -> std::result::Result<String, GatewayError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("collision".to_string())
        }

        async fn answer(
            &self,
            _request: &AnswerRequest,
        ) -> std::result::Result<Option<String>, GatewayError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn slow_classifier_times_out() {
        let config = PipelineConfig {
            classify_timeout: Duration::from_millis(50),
            ..PipelineConfig::default()
        };
        let pipeline = ClaimPipeline::new(
            Arc::new(QuestionCatalog::auto_policy().unwrap()),
            Arc::new(StalledClassifier),
            config,
        );

        let started = std::time::Instant::now();
        let result = pipeline.submit(LossSubmission::new("Hit a lamp post")).await;

        assert!(matches!(
            result,
            Err(FlowError::Classification(GatewayError::Timeout))
        ));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn answer_failure_yields_no_form() {
        let gateway = Arc::new(ScriptedGateway::new(
            "collision",
            &[("whoWasDriving", "driver-1"), ("wasVehicleTowed", "FAIL")],
        ));

        let result = pipeline(gateway)
            .submit(LossSubmission::new("Rear-ended on Sukhumvit"))
            .await;

        match result {
            Err(FlowError::AnswerFetch { question_id, .. }) => {
                assert_eq!(question_id, "wasVehicleTowed")
            }
            other => panic!("expected AnswerFetch, got {other:?}"),
        }
    }

    #[test]
    fn context_literals_match_inference_output() {
        assert_eq!(context_literal(&json!(true)), Some("true".into()));
        assert_eq!(context_literal(&json!(3)), Some("3".into()));
        assert_eq!(context_literal(&json!(["a", "b"])), Some("a, b".into()));
        assert_eq!(context_literal(&json!({"value": 1})), None);
    }
}

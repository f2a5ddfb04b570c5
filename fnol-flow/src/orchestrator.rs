//! Bounded fan-out of per-question answer calls.
//!
//! Every question handed to [`AnswerOrchestrator::resolve`] becomes one task
//! in a [`JoinSet`]. A task holds a semaphore permit for the duration of its
//! inference call, so no more than `max_concurrency` calls are outstanding at
//! once across all requests served by the same orchestrator. The first
//! failure aborts the remaining tasks and fails the whole resolution.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::{
    error::{FlowError, GatewayError, Result},
    event::EventType,
    gateway::{AnswerRequest, InferenceGateway, QuestionSchema},
    question::Question,
};

/// Question id to raw answer (`None` for a `null` answer)
pub type RawAnswerMap = HashMap<String, Option<String>>;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_concurrency: usize,
    pub call_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            call_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct AnswerOrchestrator {
    gateway: Arc<dyn InferenceGateway>,
    permits: Arc<Semaphore>,
    call_timeout: Duration,
}

impl AnswerOrchestrator {
    /// `max_concurrency` is clamped to at least one permit.
    pub fn new(gateway: Arc<dyn InferenceGateway>, config: OrchestratorConfig) -> Self {
        Self {
            gateway,
            permits: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            call_timeout: config.call_timeout,
        }
    }

    /// Resolve an answer for every question, or fail on the first error.
    ///
    /// On success the map holds exactly one entry per question.
    pub async fn resolve(
        &self,
        description: &str,
        event_type: EventType,
        questions: &[&Question],
    ) -> Result<RawAnswerMap> {
        info!(
            event_type = %event_type,
            question_count = questions.len(),
            available_permits = self.permits.available_permits(),
            "Resolving answers"
        );

        let mut join_set = JoinSet::new();

        for question in questions {
            let request = AnswerRequest {
                description: description.to_string(),
                event_type,
                question: QuestionSchema::from(*question),
            };
            let gateway = Arc::clone(&self.gateway);
            let permits = Arc::clone(&self.permits);
            let call_timeout = self.call_timeout;

            join_set.spawn(async move {
                let question_id = request.question.id.clone();
                let result = fetch_answer(gateway, permits, call_timeout, request).await;
                (question_id, result)
            });
        }

        let mut answers = RawAnswerMap::with_capacity(questions.len());

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((question_id, Ok(answer))) => {
                    debug!(question_id = %question_id, answer = ?answer, "Answer resolved");
                    answers.insert(question_id, answer);
                }
                Ok((question_id, Err(source))) => {
                    error!(
                        question_id = %question_id,
                        error = %source,
                        "Answer call failed, aborting resolution"
                    );
                    join_set.abort_all();
                    return Err(FlowError::AnswerFetch {
                        question_id,
                        source,
                    });
                }
                Err(join_error) => {
                    error!(error = %join_error, "Answer task did not complete");
                    join_set.abort_all();
                    return Err(FlowError::AnswerFetch {
                        question_id: "unknown".to_string(),
                        source: GatewayError::RequestFailed(join_error.to_string()),
                    });
                }
            }
        }

        info!(answer_count = answers.len(), "All answers resolved");
        Ok(answers)
    }
}

async fn fetch_answer(
    gateway: Arc<dyn InferenceGateway>,
    permits: Arc<Semaphore>,
    call_timeout: Duration,
    request: AnswerRequest,
) -> std::result::Result<Option<String>, GatewayError> {
    let _permit = permits
        .acquire_owned()
        .await
        .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

    tokio::time::timeout(call_timeout, gateway.answer(&request))
        .await
        .map_err(|_| GatewayError::Timeout)?
}

pub mod catalog;
pub mod context;
pub mod dependency;
pub mod error;
pub mod event;
pub mod gateway;
pub mod normalize;
pub mod orchestrator;
pub mod pipeline;
pub mod question;
pub mod shape;

// Re-export commonly used types
pub use catalog::QuestionCatalog;
pub use context::AnswerContext;
pub use dependency::relevant_questions;
pub use error::{FlowError, GatewayError, Result};
pub use event::EventType;
pub use gateway::{
    AnswerRequest, ClassificationRequest, InferenceGateway, QuestionSchema, parse_answer,
    parse_classification,
};
pub use normalize::{NormalizedAnswers, NormalizedValue, normalize, normalize_answer};
pub use orchestrator::{AnswerOrchestrator, OrchestratorConfig, RawAnswerMap};
pub use pipeline::{ClaimForm, ClaimPipeline, LossSubmission, PipelineConfig};
pub use question::{DependencyCondition, ElementType, Lov, Question, Validation, question_ids};
pub use shape::{Envelope, ShapedAnswer, ShapedAnswers, shape, shape_answer};

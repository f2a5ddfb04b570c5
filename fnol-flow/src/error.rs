use thiserror::Error;

/// Failure of a single outbound call to the inference service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("call timed out")]
    Timeout,

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Event classification failed: {0}")]
    Classification(#[source] GatewayError),

    #[error("Answer resolution failed for question '{question_id}': {source}")]
    AnswerFetch {
        question_id: String,
        #[source]
        source: GatewayError,
    },

    #[error("Catalog integrity violation: {0}")]
    CatalogIntegrity(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;

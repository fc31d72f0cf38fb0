//! Error types for Parallax.
//!
//! A malformed plan or judgment cannot be safely defaulted without risking a
//! silently wrong geometric decision, so format failures terminate the run
//! instead of being patched over. Partial perception answers and an exhausted
//! step budget are not errors.

use crate::model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParallaxError {
    #[error("response contains no <answer>...</answer> block")]
    MissingAnswerTag,

    #[error("malformed action plan: {0}")]
    MalformedPlan(String),

    #[error("camera error: {0}")]
    Camera(String),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParallaxError {
    /// Whether this failure came from decoding a model response, as opposed
    /// to a collaborator being unreachable.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            ParallaxError::MissingAnswerTag | ParallaxError::MalformedPlan(_)
        )
    }
}

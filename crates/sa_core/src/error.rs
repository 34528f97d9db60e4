use thiserror::Error;

/// Fatal errors that abort a whole calculation request.
///
/// Per-metric problems (missing parameters, type mismatches, evaluation
/// failures) are deliberately NOT represented here. They are carried as data
/// inside the result's diagnostic channel so that a single bad metric cannot
/// block an entire player's calculation.
#[derive(Error, Debug)]
pub enum CalculationError {
    #[error("game not found: {0}")]
    GameNotFound(String),

    #[error("game `{0}` is not active")]
    GameInactive(String),

    #[error("configuration error in game `{game_id}`: {message}")]
    Configuration { game_id: String, message: String },

    #[error("input set is for game `{found}`, expected `{expected}`")]
    GameMismatch { expected: String, found: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CalculationError {
    pub fn configuration(game_id: impl Into<String>, message: impl Into<String>) -> Self {
        CalculationError::Configuration { game_id: game_id.into(), message: message.into() }
    }

    /// Whether the caller could retry after fixing the request (as opposed
    /// to the game configuration itself being broken).
    pub fn is_request_error(&self) -> bool {
        match self {
            CalculationError::GameNotFound(_) => true,
            CalculationError::GameMismatch { .. } => true,
            CalculationError::Serialization(_) => true,
            CalculationError::GameInactive(_) => false,
            CalculationError::Configuration { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CalculationError>;

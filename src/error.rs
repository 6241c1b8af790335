use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The caller handed over something that cannot be trained on or decoded.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The parameter tables do not describe a usable HMM.
    #[error("model inconsistency: {0}")]
    ModelInconsistency(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    BsonEncode(#[from] bson::ser::Error),
    #[error(transparent)]
    BsonDecode(#[from] bson::de::Error),
}

impl Error {
    pub(crate) fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn inconsistent<S: Into<String>>(msg: S) -> Self {
        Self::ModelInconsistency(msg.into())
    }
}

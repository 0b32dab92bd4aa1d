pub type GpsMapResult<T> = Result<T, GpsMapError>;

#[derive(thiserror::Error, Debug)]
pub enum GpsMapError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("tile error: {0}")]
    Tile(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GpsMapError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn tile(msg: impl Into<String>) -> Self {
        Self::Tile(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for anomalies in the input data that skip a unit of work instead of failing it.
    pub fn is_data_anomaly(&self) -> bool {
        matches!(self, Self::Data(_))
    }
}

impl From<serde_json::Error> for GpsMapError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

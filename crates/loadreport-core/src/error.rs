use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Detection error: {0}")]
    Detection(String),

    #[error("Ingestion error in {path}: {message}")]
    Ingestion { path: String, message: String },

    #[error("Aggregation error: {0}")]
    Aggregation(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ReportError {
    /// Build an ingestion error carrying the offending file path.
    pub fn ingestion(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ingestion {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl Serialize for ReportError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }
}

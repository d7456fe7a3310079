use crate::domain::errors::DispatchError;

/// Outcome of a single notification dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    pub success: bool,
    pub server_message_id: Option<String>,
    pub error: Option<DispatchError>,
}

impl DispatchResult {
    pub fn delivered(server_message_id: Option<String>) -> Self {
        Self {
            success: true,
            server_message_id,
            error: None,
        }
    }

    pub fn failed(error: DispatchError) -> Self {
        Self {
            success: false,
            server_message_id: None,
            error: Some(error),
        }
    }
}

impl From<Result<Option<String>, DispatchError>> for DispatchResult {
    fn from(result: Result<Option<String>, DispatchError>) -> Self {
        match result {
            Ok(id) => Self::delivered(id),
            Err(e) => Self::failed(e),
        }
    }
}

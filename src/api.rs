use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// `{"error": {"message": "..."}}`, the body of every failed bookmark request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorMessage,
}

impl ErrorResponse {
    pub fn new(msg: &str) -> Self {
        ErrorResponse {
            error: ErrorMessage { message: msg.to_owned() },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new_from_msg(msg: &str) -> Self {
        StatusResponse { status: msg.to_owned() }
    }
}

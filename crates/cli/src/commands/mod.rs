pub mod ask;
pub mod config;
pub mod doctor;

use serde::Serialize;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_GATEWAY_SETUP: u8 = 3;
pub const EXIT_DOCTOR_FAILED: u8 = 4;
pub const EXIT_GENERATION: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(&payload) }
    }

    /// Command-specific JSON body with the given exit code.
    pub fn payload<T: Serialize>(exit_code: u8, payload: &T) -> Self {
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload<T: Serialize>(payload: &T) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

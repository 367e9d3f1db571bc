use thiserror::Error;

/// Failure of one completion call. The gateway is single-attempt; callers decide how to
/// degrade.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("completion request failed: {0}")]
    Request(String),
    #[error("completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion response could not be decoded: {0}")]
    Decode(String),
    #[error("completion response contained no text")]
    EmptyCompletion,
}

/// Failure to hand a reply back to the messaging platform. Never retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("reply request failed: {0}")]
    Request(String),
    #[error("reply endpoint rejected the message with {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("generation unavailable: {message}")]
    GenerationUnavailable { message: String, correlation_id: String },
    #[error("delivery failed: {message}")]
    DeliveryFailed { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    /// Fixed text safe to show an end user. Technical detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::GenerationUnavailable { .. } => {
                "抱歉，標題產生服務暫時無法使用，請稍後再把逐字稿傳給我一次。"
            }
            Self::DeliveryFailed { .. } | Self::Internal { .. } => {
                "抱歉，系統發生了一點問題，請稍後再試。"
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::GenerationUnavailable { correlation_id, .. }
            | Self::DeliveryFailed { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::GenerationUnavailable { correlation_id: id, .. }
            | InterfaceError::DeliveryFailed { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Gateway(error) => {
                Self::GenerationUnavailable { message: error.to_string(), correlation_id }
            }
            ApplicationError::Delivery(error) => {
                Self::DeliveryFailed { message: error.to_string(), correlation_id }
            }
            ApplicationError::Configuration(message) => Self::Internal { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DeliveryError, GatewayError, InterfaceError};

    #[test]
    fn gateway_error_maps_to_generation_unavailable() {
        let interface = ApplicationError::from(GatewayError::Status {
            status: 503,
            body: "overloaded".to_owned(),
        })
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::GenerationUnavailable { ref correlation_id, .. } if correlation_id == "req-1"
        ));
        assert_eq!(interface.correlation_id(), "req-1");
    }

    #[test]
    fn user_message_never_contains_technical_detail() {
        let interface = ApplicationError::from(GatewayError::Decode(
            "expected value at line 1 column 1".to_owned(),
        ))
        .into_interface("req-2");

        assert!(!interface.user_message().contains("line 1"));
        assert!(interface.to_string().contains("line 1"));
    }

    #[test]
    fn delivery_error_maps_to_delivery_failed() {
        let interface = ApplicationError::from(DeliveryError::Rejected {
            status: 400,
            body: "Invalid reply token".to_owned(),
        })
        .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::DeliveryFailed { .. }));
    }

    #[test]
    fn configuration_error_maps_to_internal() {
        let interface = ApplicationError::Configuration("missing channel token".to_owned())
            .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "抱歉，系統發生了一點問題，請稍後再試。");
    }
}

//! Rejections surfaced to clients, with numeric error codes.
//!
//! Codes share the JSON-RPC server-error range so existing client back-off
//! logic keyed on them keeps working.

use ql_02_admission::{Rejection, RejectionReason};
use ql_03_query_cost::CostRejection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Error codes carried in [`ErrorPayload::code`]
pub mod codes {
    pub const INTERNAL_ERROR: i32 = -32603;

    // Server errors (-32000 to -32099)
    pub const RESOURCE_UNAVAILABLE: i32 = -32002;
    pub const LIMIT_EXCEEDED: i32 = -32005;

    // Quota and ban rejections
    pub const RATE_LIMITED: i32 = -32029;
}

/// Why an operation was turned away before execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayRejection {
    #[error("{0}")]
    Admission(#[from] Rejection),

    #[error("{0}")]
    Cost(#[from] CostRejection),
}

impl GatewayRejection {
    pub fn code(&self) -> i32 {
        match self {
            GatewayRejection::Admission(rejection) => match rejection.reason {
                RejectionReason::Banned | RejectionReason::QuotaExceeded => codes::RATE_LIMITED,
                RejectionReason::StoreUnavailable => codes::RESOURCE_UNAVAILABLE,
            },
            GatewayRejection::Cost(_) => codes::LIMIT_EXCEEDED,
        }
    }

    /// Back-off hint for the client, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GatewayRejection::Admission(rejection) => rejection.retry_after,
            GatewayRejection::Cost(_) => None,
        }
    }

    /// Short machine-readable reason, used as a metrics label.
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayRejection::Admission(rejection) => rejection.reason.as_str(),
            GatewayRejection::Cost(rejection) => rejection.ceiling(),
        }
    }

    /// Client-facing payload.
    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            GatewayRejection::Admission(rejection) => {
                let mut data = json!({
                    "reason": rejection.reason.as_str(),
                    "scope": rejection.scope.to_string(),
                });
                if let Some(window) = rejection.window {
                    data["window"] = json!(window.as_str());
                }
                if let Some(limit) = rejection.limit {
                    data["limit"] = json!(limit);
                }
                if let Some(retry_after) = rejection.retry_after {
                    data["retry_after_ms"] = json!(retry_after.as_millis() as u64);
                }
                ErrorPayload::with_data(self.code(), rejection.message(), data)
            }
            GatewayRejection::Cost(rejection) => {
                let max = match rejection {
                    CostRejection::DepthExceeded { max, .. } => *max as u64,
                    CostRejection::ComplexityExceeded { max, .. } => *max,
                };
                let data = json!({
                    "ceiling": rejection.ceiling(),
                    "value": rejection.value(),
                    "max": max,
                });
                ErrorPayload::with_data(self.code(), rejection.to_string(), data)
            }
        }
    }
}

/// Error object returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorPayload {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: i32, message: impl Into<String>, data: Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Generic failure that must not leak internals.
    pub fn internal() -> Self {
        Self::new(codes::INTERNAL_ERROR, "Internal error")
    }
}

impl From<&GatewayRejection> for ErrorPayload {
    fn from(rejection: &GatewayRejection) -> Self {
        rejection.to_payload()
    }
}

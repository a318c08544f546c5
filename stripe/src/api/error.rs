use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{}", stripe_message(.status, .error_type, .code, .message, .param))]
    Stripe {
        status: u16,
        error_type: String,
        code: Option<String>,
        message: String,
        param: Option<String>,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// Stripe signals throttling with HTTP 429 and a `rate_limit` code
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ApiError::Stripe {
                status,
                error_type,
                code,
                ..
            } => {
                *status == 429 || error_type == "rate_limit" || code.as_deref() == Some("rate_limit")
            }
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::Stripe { status, code, .. } => {
                *status == 404 || code.as_deref() == Some("resource_missing")
            }
            _ => false,
        }
    }

    /// Build from a non-2xx response body; bodies that are not Stripe error
    /// envelopes keep their raw text as the message
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => ApiError::Stripe {
                status,
                error_type: envelope.error.error_type,
                code: envelope.error.code,
                message: envelope.error.message.unwrap_or_default(),
                param: envelope.error.param,
            },
            Err(_) => ApiError::Stripe {
                status,
                error_type: "api_error".to_string(),
                code: None,
                message: if body.is_empty() {
                    "Unknown error".to_string()
                } else {
                    body.to_string()
                },
                param: None,
            },
        }
    }
}

fn stripe_message(
    status: &u16,
    error_type: &str,
    code: &Option<String>,
    message: &str,
    param: &Option<String>,
) -> String {
    let mut out = format!("Stripe API error (HTTP {}, {}", status, error_type);
    if let Some(code) = code {
        out.push_str(&format!(", {}", code));
    }
    out.push_str(&format!("): {}", message));
    if let Some(param) = param {
        out.push_str(&format!(" [param: {}]", param));
    }
    out
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type", default)]
    error_type: String,
    code: Option<String>,
    message: Option<String>,
    param: Option<String>,
}

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::bridge::Outcome;

/// A method invocation from the calling application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,

    /// Named arguments (a JSON object, or absent)
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Typed argument lookup; `None` if absent or of the wrong type
    pub fn argument<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.arguments
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// The single reply to a method call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodReply {
    Success { result: String },
    Error { code: String, message: String },
    NotImplemented,
}

impl From<Outcome> for MethodReply {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Ok(result) => Self::Success { result },
            Err(e) => Self::Error {
                code: e.code().to_string(),
                message: e.to_string(),
            },
        }
    }
}

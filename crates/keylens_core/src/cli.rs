use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CliClientResponse {
    pub uuid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CliOutputFormat {
    #[default]
    #[serde(rename = "RAW")]
    Raw,
    #[serde(rename = "TEXT")]
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandExecutionStatus {
    Success,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCommandRequest {
    pub command: String,
    pub output_format: CliOutputFormat,
}

impl SendCommandRequest {
    pub fn raw(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            output_format: CliOutputFormat::Raw,
        }
    }
}

/// Reply of a single command; `response` is the raw Redis reply rendered as JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SendCommandResponse {
    #[serde(default)]
    pub response: Value,
    pub status: CommandExecutionStatus,
}

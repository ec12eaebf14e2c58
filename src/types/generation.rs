//! Generation settings and related enums.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Settings controlling a single model request.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub stop_sequences: Option<Vec<String>>,
}

/// Why generation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    StopSequence,
    Error,
}

impl FinishReason {
    /// Map an Anthropic `stop_reason` string.
    pub fn from_anthropic(stop_reason: &str) -> Option<Self> {
        match stop_reason {
            "end_turn" => Some(Self::Stop),
            "max_tokens" => Some(Self::Length),
            "tool_use" => Some(Self::ToolCalls),
            "stop_sequence" => Some(Self::StopSequence),
            _ => None,
        }
    }
}

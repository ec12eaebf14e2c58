//! Run state machine types.

use strum::AsRefStr;

use crate::types::AgentToolCall;

/// State of a single `run` call. Entered fresh at `AwaitingModel` each time.
#[derive(Debug, Clone, PartialEq, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    AwaitingModel,
    ExecutingTools(Vec<AgentToolCall>),
    TerminalText(String),
    TerminalBound,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// The model produced a final answer.
    Text,
    /// The round bound was reached first.
    Bound,
}

/// Result of [`crate::agent::AgentRuntime::run_detailed`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub text: String,
    /// Model round-trips made during the run.
    pub rounds: u32,
    pub terminal: Terminal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names_are_screaming_snake_case() {
        assert_eq!(RunState::AwaitingModel.as_ref(), "AWAITING_MODEL");
        assert_eq!(RunState::ExecutingTools(vec![]).as_ref(), "EXECUTING_TOOLS");
        assert_eq!(RunState::TerminalBound.as_ref(), "TERMINAL_BOUND");
    }
}

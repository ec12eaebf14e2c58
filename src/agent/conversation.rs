//! Conversation history owned by one agent.

use crate::types::{ModelMessage, Role};

/// Append-only ordered turns, replayed to the model on every round.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ModelMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ModelMessage] {
        &self.messages
    }

    pub fn push(&mut self, message: ModelMessage) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = ModelMessage>) {
        self.messages.extend(messages);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Drop the oldest turns so at most `max` remain. Returns how many were dropped.
    ///
    /// The kept history always starts at a user-authored text turn, so a
    /// tool-result turn is never separated from the tool-use turn it answers.
    /// When no such cut point exists within the window everything is dropped.
    pub fn compact_to(&mut self, max: usize) -> usize {
        let len = self.messages.len();
        if len <= max {
            return 0;
        }
        let cut = (len - max..len)
            .find(|&idx| {
                let msg = &self.messages[idx];
                msg.role == Role::User && !msg.is_tool_result_turn()
            })
            .unwrap_or(len);
        self.messages.drain(..cut);
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentToolCall, AgentToolResult, ContentPart};

    fn tool_round() -> [ModelMessage; 2] {
        [
            ModelMessage::assistant_parts(vec![ContentPart::ToolCall(AgentToolCall {
                id: "t".into(),
                name: "list_events".into(),
                arguments: serde_json::json!({}),
            })]),
            ModelMessage::tool_results(vec![AgentToolResult::success("t", "[]")]),
        ]
    }

    #[test]
    fn compaction_is_a_no_op_under_the_limit() {
        let mut conv = Conversation::new();
        conv.push(ModelMessage::user("hi"));
        conv.push(ModelMessage::assistant("hello"));
        assert_eq!(conv.compact_to(4), 0);
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn compaction_never_starts_on_a_tool_result() {
        let mut conv = Conversation::new();
        conv.push(ModelMessage::user("first"));
        conv.extend(tool_round());
        conv.push(ModelMessage::assistant("done"));
        conv.push(ModelMessage::user("second"));
        conv.push(ModelMessage::assistant("ok"));

        // A window of 4 would start at the tool-result turn; the cut moves
        // forward to the next user text turn instead.
        let dropped = conv.compact_to(4);
        assert_eq!(dropped, 4);
        assert_eq!(conv.messages()[0].text(), "second");
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn compaction_drops_everything_without_a_cut_point() {
        let mut conv = Conversation::new();
        conv.push(ModelMessage::user("first"));
        conv.extend(tool_round());
        assert_eq!(conv.compact_to(2), 3);
        assert!(conv.is_empty());
    }
}

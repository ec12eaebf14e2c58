//! Agent runtime: one conversation driven through the bounded tool-use loop.

pub mod conversation;
pub mod runtime;
pub mod state;

pub use conversation::Conversation;
pub use runtime::{AgentIdentity, AgentRuntime, BOUND_FALLBACK};
pub use state::{RunOutcome, RunState, Terminal};

//! Muse: a routed set of tool-using agents that run the business side of an
//! independent musician's career.
//!
//! A [`Classifier`](router::Classifier) labels each message, the
//! [`Orchestrator`](orchestrator::Orchestrator) hands it to the domain agent
//! for that label, and the agent's [`AgentRuntime`](agent::AgentRuntime)
//! alternates model turns and tool calls until it has an answer.
//!
//! # Quick Start
//!
//! ```no_run
//! use muse::prelude::*;
//!
//! # async fn example() -> muse::error::Result<()> {
//! let config = MuseConfig::from_env()?;
//! let mut muse = Orchestrator::from_config(&config, Backends::default())?;
//! let reply = muse.route("Am I free next Saturday night?").await?;
//! println!("[{}] {}", reply.label, reply.text);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod domains;
pub mod error;
pub mod orchestrator;
pub mod prelude;
pub mod provider;
pub mod router;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;

//! Command-line interface for Muse.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Muse: your music business assistant
#[derive(Parser, Debug)]
#[command(name = "muse", version, about = "Muse: agents for the business side of a music career")]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the model
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Override the per-message round bound
    #[arg(long, global = true)]
    pub max_rounds: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive session (/reset clears history, /quit exits)
    Chat,
    /// Route a single message and print the reply
    Ask {
        /// The message to send
        message: String,
    },
}

/// REPL commands recognized in `chat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput<'a> {
    Quit,
    Reset,
    Empty,
    Message(&'a str),
}

impl<'a> ReplInput<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            "" => Self::Empty,
            "/quit" | "/exit" => Self::Quit,
            "/reset" => Self::Reset,
            message => Self::Message(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ask_with_global_flags() {
        let cli = Cli::try_parse_from(["muse", "ask", "hi there", "--max-rounds", "4"]).unwrap();
        assert_eq!(cli.max_rounds, Some(4));
        match cli.command {
            Commands::Ask { message } => assert_eq!(message, "hi there"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn repl_input() {
        assert_eq!(ReplInput::parse("  /reset "), ReplInput::Reset);
        assert_eq!(ReplInput::parse("/quit"), ReplInput::Quit);
        assert_eq!(ReplInput::parse("   "), ReplInput::Empty);
        assert_eq!(ReplInput::parse(" book it "), ReplInput::Message("book it"));
    }
}

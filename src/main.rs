//! Muse CLI binary entry point.

use std::io::Write;

use clap::Parser;
use muse::cli::{Cli, Commands, ReplInput};
use muse::config::MuseConfig;
use muse::domains::Backends;
use muse::orchestrator::{Orchestrator, RouteResponse};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("muse=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = MuseConfig::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(max_rounds) = cli.max_rounds {
        if max_rounds == 0 {
            return Err("--max-rounds must be at least 1".into());
        }
        config.runtime.max_rounds = max_rounds;
    }

    let mut muse = Orchestrator::from_config(&config, Backends::default())?;

    match cli.command {
        Commands::Ask { message } => {
            let reply = muse.route(&message).await?;
            print_reply(&reply);
        }
        Commands::Chat => chat(&mut muse, &config).await?,
    }
    Ok(())
}

async fn chat(muse: &mut Orchestrator, config: &MuseConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Muse for {} ({}). /reset clears history, /quit exits.",
        config.profile.artist_name, config.model
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match ReplInput::parse(&line) {
            ReplInput::Quit => break,
            ReplInput::Empty => continue,
            ReplInput::Reset => {
                muse.reset();
                println!("History cleared.");
            }
            // Model failures end this message, not the session.
            ReplInput::Message(message) => match muse.route(message).await {
                Ok(reply) => print_reply(&reply),
                Err(e) => eprintln!("Error: {e}"),
            },
        }
    }
    Ok(())
}

fn print_reply(reply: &RouteResponse) {
    println!("[{}] {}", reply.label, reply.text);
}

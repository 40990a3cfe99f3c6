use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::Gemini;
use roam_common::{Budget, Config, Coordinates, TravelGroup, UserPreferences};
use roam_guide::community::CommunityBoard;
use roam_guide::voting::VotePolicy;
use roam_guide::{Action, App};

#[derive(Parser)]
#[command(name = "roam", about = "Live local events and a grounded guide chat")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the nearby-events feed as JSON
    Feed(SessionArgs),
    /// Ask the guide one question and print the reply as JSON
    Chat {
        query: String,
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Print community posts by votes with their comment gate
    Community,
}

#[derive(Args)]
struct SessionArgs {
    /// solo, couple, family or friends
    #[arg(long, default_value = "solo")]
    group: TravelGroup,
    /// free, budget, moderate or luxury
    #[arg(long, default_value = "moderate")]
    budget: Budget,
    /// Free-text interest, e.g. "jazz"
    #[arg(long, default_value = "")]
    interest: String,
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,
}

impl SessionArgs {
    fn preferences(&self) -> UserPreferences {
        UserPreferences {
            group: self.group,
            budget: self.budget,
            activity_type: self.interest.clone(),
        }
    }

    fn location(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.lat?, self.lng?))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("roam=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Feed(session) => {
            let mut app = live_app()?.with_session(None, session.preferences());
            app.dispatch(Action::LocationResolved(session.location())).await?;
            println!("{}", serde_json::to_string_pretty(&app.state().feed)?);
        }
        Command::Chat { query, session } => {
            let mut app = live_app()?.with_session(session.location(), session.preferences());
            app.dispatch(Action::UserMessageSent(query)).await?;
            match app.state().messages.last() {
                Some(reply) => println!("{}", serde_json::to_string_pretty(reply)?),
                None => anyhow::bail!("query was blank"),
            }
        }
        Command::Community => {
            let config = Config::offline_from_env()?;
            config.log_redacted();
            let board = CommunityBoard::seeded(
                Utc::now().timestamp_millis(),
                VotePolicy::new(config.comment_unlock_threshold),
            );
            let listing: Vec<_> = board
                .sorted_by_votes()
                .into_iter()
                .map(|event| {
                    let gate = board.policy().comment_gate(event.votes, event.comments.len());
                    json!({
                        "event": event,
                        "commentsUnlocked": gate.is_unlocked(),
                        "commentGate": gate.to_string(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }

    Ok(())
}

fn live_app() -> Result<App> {
    let config = Config::from_env()?;
    config.log_redacted();

    let mut gemini = Gemini::new(&config.gemini_api_key, &config.model);
    if let Some(ref url) = config.gemini_base_url {
        gemini = gemini.with_base_url(url);
    }
    info!(model = gemini.model(), "Using Gemini");

    Ok(App::new(&config, Arc::new(gemini))?)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak CLI
//!
//! Command-line front end for the Community Streak API. The session is kept
//! in a local state file between invocations and refreshed transparently.

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use streak_client::{
    config::Config,
    error::ApiError,
    models::{NewEvent, SignupRequest},
    services::RecordingNavigator,
    store::FileStore,
    StreakClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Streak CLI - join events and keep your streaks going.
#[derive(Parser)]
#[command(name = "streak")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "STREAK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and store the session
    Login {
        /// Username or email
        username: String,
        #[arg(long, env = "STREAK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the logged-in user
    Me,
    /// List events
    Events {
        /// Filter by flags (e.g. "user_created")
        #[arg(long)]
        flags: Option<String>,
    },
    /// List events you joined
    Joined,
    /// List events you created
    Created,
    /// Show an event with its leaderboard
    Show {
        id: u64,
        /// Leaderboard size
        #[arg(long)]
        top: Option<u32>,
    },
    /// Join an event
    Join { id: u64 },
    /// Leave an event
    Exit { id: u64 },
    /// Record today's completion
    Complete { id: u64 },
    /// Create an event
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        private: bool,
    },
    /// Print motivation messages as they arrive
    Listen,
    /// Show recently received messages
    Notifications,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(api_url = %config.api_url, state_file = %config.state_file.display(), "Starting");

    let store = Arc::new(FileStore::open(&config.state_file)?);
    let client = StreakClient::new(config, store, Arc::new(RecordingNavigator::default()))?;

    match run(&client, cli.command).await {
        Err(e) if e.requires_login() => {
            anyhow::bail!("{} (run `streak login`)", e)
        }
        other => Ok(other?),
    }
}

async fn run(client: &StreakClient, command: Commands) -> Result<(), ApiError> {
    let api = client.api();

    match command {
        Commands::Signup {
            username,
            email,
            password,
        } => {
            let response = api
                .signup(&SignupRequest {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("{}", response.message);
        }
        Commands::Login { username, password } => {
            let outcome = api.login(&username, &password).await?;
            println!("Logged in as {} (continue at {})", outcome.profile.username, outcome.destination);
        }
        Commands::Logout => {
            api.logout().await?;
            println!("Logged out");
        }
        Commands::Me => print_json(&api.me().await?)?,
        Commands::Events { flags } => {
            client.guard().record_location("/events");
            print_json(&api.events(flags.as_deref()).await?)?;
        }
        Commands::Joined => {
            client.guard().record_location("/mystreaks");
            print_json(&api.joined_events().await?)?;
        }
        Commands::Created => {
            client.guard().record_location("/myevents");
            print_json(&api.created_events().await?)?;
        }
        Commands::Show { id, top } => {
            client.guard().record_location(&format!("/events/{}", id));
            print_json(&api.event_detail(id, top).await?)?;
        }
        Commands::Join { id } => {
            let mut membership = load_membership(client, id).await?;
            let status = membership.join().await?;
            println!("Joined event {} ({:?})", id, status);
        }
        Commands::Exit { id } => {
            let mut membership = load_membership(client, id).await?;
            membership.exit().await?;
            println!("Left event {}", id);
        }
        Commands::Complete { id } => {
            let mut membership = load_membership(client, id).await?;
            membership.mark_complete().await?;
            println!("Streak for event {}: {}", id, membership.streak_count());
        }
        Commands::Create {
            name,
            description,
            private,
        } => {
            let created = api
                .create_event(&NewEvent {
                    name,
                    description,
                    is_private: private,
                })
                .await?;
            println!("{} (id {})", created.message, created.event.id);
        }
        Commands::Listen => {
            let mut feed = client.notification_feed().await?;
            while let Some(message) = feed.next().await {
                client.notifications().push(&message)?;
                println!("{}", message);
            }
        }
        Commands::Notifications => {
            for message in client.notifications().recent()? {
                println!("{}", message);
            }
        }
    }

    Ok(())
}

async fn load_membership(
    client: &StreakClient,
    event_id: u64,
) -> Result<streak_client::services::EventMembershipController, ApiError> {
    client.guard().record_location(&format!("/events/{}", event_id));
    let user = match client.api().cached_user()? {
        Some(user) => user,
        None => client.api().me().await?,
    };
    client.membership(event_id, user.id).await
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ApiError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to format output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("streak_client=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}

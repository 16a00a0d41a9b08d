//! Walks through the polling API end to end: register, login, create a poll,
//! vote on it and print the results.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use poll_core::{AuthToken, ClientConfig, Poll, PollApi, DEFAULT_BASE_URL};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const PASSWORD: &str = "a-secure-password";
const QUESTION: &str = "What is your favorite programming language?";
const OPTIONS: [&str; 4] = ["Python", "JavaScript", "Go", "Rust"];

#[derive(Parser, Debug)]
#[command(name = "poll-demo", version, about = "Exercise every polling API endpoint in order")]
struct Cli {
    /// Root address of the polling service
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Abort any single request after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = ClientConfig::new(&cli.base_url);
    if let Some(secs) = cli.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    let api = PollApi::from_config(&config);

    // Unique per run so repeated runs do not collide on registration.
    let username = format!("testuser_{}", chrono::Utc::now().timestamp());

    println!("--- Step 1: Registering user '{username}' ---");
    let user = api
        .register(&username, PASSWORD)
        .context("failed to register user")?;
    println!("User registered successfully:");
    println!("{user}");
    separator();

    println!("--- Step 2: Logging in as '{username}' ---");
    let login = api.login(&username, PASSWORD).context("failed to log in")?;
    let token = AuthToken::from_login(&login)
        .ok_or_else(|| anyhow!("login response did not contain an access token"))?;
    println!("Logged in successfully. Token received.");
    separator();

    println!("--- Step 3: Creating a new poll ---");
    let created = api
        .create_poll(QUESTION, &OPTIONS, &token)
        .context("failed to create poll")?;
    println!("Poll created successfully:");
    println!("{}", pretty(&created)?);
    let (poll_id, option_id) = first_option(&created)?;
    separator();

    println!("--- Step 4: Casting a vote on poll {poll_id} for option {option_id} ---");
    // Results are still worth fetching when the vote is rejected.
    match api.cast_vote(poll_id, option_id, &token) {
        Ok(confirmation) => {
            println!("Vote cast successfully:");
            println!("{}", pretty(&confirmation)?);
        }
        Err(err) => println!("Failed to cast vote: {err}"),
    }
    separator();

    println!("--- Step 5: Retrieving results for poll {poll_id} ---");
    let results = api
        .poll_results(poll_id)
        .context("failed to retrieve poll results")?;
    println!("Poll results retrieved successfully:");
    println!("{}", pretty(&results)?);
    Ok(())
}

/// Poll id and the id of its first option, from a create-poll response.
fn first_option(created: &Value) -> Result<(i64, i64)> {
    let poll: Poll = serde_json::from_value(created.clone())
        .context("create-poll response did not look like a poll")?;
    let option = poll
        .options
        .first()
        .ok_or_else(|| anyhow!("created poll {} has no options", poll.id))?;
    Ok((poll.id, option.id))
}

fn pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn separator() {
    println!("\n{}\n", "-".repeat(20));
}

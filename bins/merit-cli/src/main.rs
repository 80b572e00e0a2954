//! merit-cli — Command-line client for the Merit reputation API.
//!
//! Queries snapshots and the leaderboard, and submits award/deduct
//! operations against a running merit-api instance.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

/// Merit command-line client.
#[derive(Parser)]
#[command(name = "merit-cli")]
#[command(version, about = "Reputation you can audit.")]
struct Cli {
    /// Merit API endpoint.
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    api: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show an identity's reputation snapshot.
    Snapshot(SnapshotArgs),
    /// Award points to an identity.
    Award(MutateArgs),
    /// Deduct points from an identity.
    Deduct(MutateArgs),
    /// Show the leaderboard.
    Leaderboard(LeaderboardArgs),
}

#[derive(Args)]
struct SnapshotArgs {
    /// Identity key (wallet address or user id).
    identity: String,
}

#[derive(Args)]
struct MutateArgs {
    /// Identity key (wallet address or user id).
    identity: String,

    /// Number of points.
    amount: u64,

    /// Reason recorded in the ledger.
    reason: String,
}

#[derive(Args)]
struct LeaderboardArgs {
    /// Maximum number of rows.
    #[arg(short, long, default_value_t = 10)]
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Snapshot(args) => {
            let url = format!("{}/api/reputation/{}", cli.api, args.identity);
            let snap = get_json(&client, &url).await?;
            print_pretty(&snap)
        }
        Commands::Award(args) => {
            let url = format!("{}/api/reputation/award", cli.api);
            let snap = post_json(&client, &url, &mutate_body(&args)).await?;
            print_pretty(&snap)
        }
        Commands::Deduct(args) => {
            let url = format!("{}/api/reputation/deduct", cli.api);
            let snap = post_json(&client, &url, &mutate_body(&args)).await?;
            print_pretty(&snap)
        }
        Commands::Leaderboard(args) => {
            let url = format!("{}/api/reputation/leaderboard?limit={}", cli.api, args.limit);
            let board = get_json(&client, &url).await?;
            print_leaderboard(&board)
        }
    }
}

fn mutate_body(args: &MutateArgs) -> Value {
    json!({
        "userId": args.identity,
        "amount": args.amount,
        "reason": args.reason,
    })
}

async fn get_json(client: &reqwest::Client, url: &str) -> Result<Value> {
    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;
    read_body(resp).await
}

async fn post_json(client: &reqwest::Client, url: &str, body: &Value) -> Result<Value> {
    let resp = client
        .post(url)
        .json(body)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;
    read_body(resp).await
}

/// Parse the response body, surfacing API-level errors as failures.
async fn read_body(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body: Value = resp.json().await.context("invalid JSON from API")?;
    if !status.is_success() {
        let msg = body["error"].as_str().unwrap_or("unknown error");
        bail!("API error ({status}): {msg}");
    }
    Ok(body)
}

fn print_pretty(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_leaderboard(board: &Value) -> Result<()> {
    let Some(rows) = board.as_array() else {
        bail!("unexpected leaderboard payload");
    };
    println!("{:<5} {:<28} {:>10} {:>6}", "#", "identity", "score", "level");
    for (i, row) in rows.iter().enumerate() {
        println!(
            "{:<5} {:<28} {:>10} {:>6}",
            i + 1,
            row["identity"].as_str().unwrap_or("?"),
            row["score"],
            row["level"],
        );
    }
    Ok(())
}

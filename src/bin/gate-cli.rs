use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Driver CLI for a running flaky-gate server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call the degrading endpoint directly
    Flaky,
    /// Call through the protective gate
    Guarded,
    /// Show gate mode and window statistics
    Status,
    /// Fire a series of guarded calls and tally live vs fallback answers
    Burst {
        #[arg(short, long, default_value_t = 20)]
        count: u32,

        #[arg(short, long, default_value_t = 100)]
        interval_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Flaky => {
            let res = client.get(format!("{}/api/flaky", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Guarded => {
            let res = client.get(format!("{}/api/guarded", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Status => {
            let res = client.get(format!("{}/api/gate", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Burst { count, interval_ms } => {
            let mut tally: BTreeMap<String, u32> = BTreeMap::new();
            for i in 0..count {
                let res = client.get(format!("{}/api/guarded", cli.url)).send().await?;
                let json: Value = res.json().await?;
                let source = json
                    .get("source")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string();
                println!("#{:<3} {:<8} {}", i + 1, source, json["body"]);
                *tally.entry(source).or_default() += 1;
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
            println!("{}", serde_json::to_string_pretty(&tally)?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

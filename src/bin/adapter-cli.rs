use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "adapter-cli")]
#[command(about = "Inspect a running gateway adapter through its admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:9095")]
    url: String,

    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the adapter is alive
    Status,
    /// Show which collections have been loaded
    Ready,
    /// Item counts for every collection
    Snapshot,
    /// Dump one collection (e.g. subscriptions, apis)
    Collection { kind: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let path = match &cli.command {
        Commands::Status => "/health/live".to_string(),
        Commands::Ready => "/health/ready".to_string(),
        Commands::Snapshot => "/admin/snapshot".to_string(),
        Commands::Collection { kind } => format!("/admin/collections/{}", kind),
    };

    let res = client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    // Readiness reports 503 with a useful body.
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if !status.is_success() => {
            eprintln!("Error: Admin API returned status {}", status);
            if !text.is_empty() {
                eprintln!("Response: {}", text);
            }
        }
        Err(_) => println!("{}", text),
    }
    Ok(())
}

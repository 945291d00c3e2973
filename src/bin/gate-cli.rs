use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Command-line client for the metrics gate API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// Send this value as X-Forwarded-For (client identity)
    #[arg(short, long)]
    forwarded_for: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service and store health
    Health,
    /// Submit one metric
    Ingest {
        #[arg(short = 't', long = "type")]
        metric_type: String,
        #[arg(short, long)]
        value: f64,
    },
    /// Fetch the summary for a metric type
    Summary {
        #[arg(short = 't', long = "type")]
        metric_type: String,
        #[arg(short, long, default_value = "any")]
        period: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(ip) = &cli.forwarded_for {
        headers.insert("x-forwarded-for", HeaderValue::from_str(ip)?);
    }

    match cli.command {
        Commands::Health => {
            let res = client
                .get(format!("{}/health", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Ingest { metric_type, value } => {
            let body = json!({
                "timestamp": chrono::Utc::now(),
                "value": value,
                "type": metric_type,
            });
            let res = client
                .post(format!("{}/api/metrics", cli.url))
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Summary { metric_type, period } => {
            let res = client
                .get(format!("{}/api/metrics/summary", cli.url))
                .query(&[("type", metric_type.as_str()), ("period", period.as_str())])
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Some(retry) = res.headers().get(reqwest::header::RETRY_AFTER) {
            eprintln!("Retry-After: {}", retry.to_str().unwrap_or("?"));
        }
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

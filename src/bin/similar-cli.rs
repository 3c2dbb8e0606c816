use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "similar-cli")]
#[command(about = "Operations CLI for the similar-products service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "SIMILAR_CLI_URL", default_value = "http://localhost:5000")]
    url: String,

    #[arg(short, long, env = "SIMILAR_CLI_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the similar products of a product
    Similar { product_id: String },
    /// Check service status
    Status,
    /// Show circuit breaker states
    Breakers,
    /// Force a breaker back to closed ("similar-ids" or "product-by-id")
    ResetBreaker { class: String },
    /// Show cache sizes
    Cache,
    /// Drop every cached result
    ClearCache,
    /// Drop the cached result of one product
    Invalidate { product_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let (method, path) = match &cli.command {
        Commands::Similar { product_id } => (Method::GET, format!("/product/{}/similar", product_id)),
        Commands::Status => (Method::GET, "/admin/status".to_string()),
        Commands::Breakers => (Method::GET, "/admin/breakers".to_string()),
        Commands::ResetBreaker { class } => (Method::POST, format!("/admin/breakers/{}/reset", class)),
        Commands::Cache => (Method::GET, "/admin/cache".to_string()),
        Commands::ClearCache => (Method::DELETE, "/admin/cache".to_string()),
        Commands::Invalidate { product_id } => (Method::DELETE, format!("/admin/cache/{}", product_id)),
    };

    let res = client
        .request(method, format!("{}{}", base, path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    if status == StatusCode::NO_CONTENT {
        println!("OK");
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "search-cli")]
#[command(about = "Command-line client for the operator search API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// Search the operator catalog
    Search {
        /// Free-text filter
        #[arg(default_value = "")]
        text: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        sort_field: Option<String>,
        #[arg(long)]
        sort_direction: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/api/v1/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Search {
            text,
            page,
            page_size,
            sort_field,
            sort_direction,
        } => {
            let mut query = vec![("search", text), ("page", page.to_string())];
            if let Some(size) = page_size {
                query.push(("pageSize", size.to_string()));
            }
            if let Some(field) = sort_field {
                query.push(("sortField", field));
            }
            if let Some(direction) = sort_direction {
                query.push(("sortDirection", direction));
            }

            let res = client
                .get(format!("{}/api/v1/operators", cli.url))
                .query(&query)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    for name in ["x-cache", "x-ratelimit-remaining", "x-ratelimit-reset"] {
        if let Some(value) = res.headers().get(name).and_then(|v| v.to_str().ok()) {
            eprintln!("{}: {}", name, value);
        }
    }

    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "vhost-ctl")]
#[command(about = "Control a running vhost-static server", long_about = None)]
struct Cli {
    /// Command server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:65001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild every site from the content root
    Reload,
    /// Reload before every request
    Devel,
    /// Stop per-request reloads and reload once
    Prod,
    /// Show hosts, settings and content statistics
    Status {
        /// Print the JSON snapshot instead of text
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Reload => "/reload",
            Commands::Devel => "/devel",
            Commands::Prod => "/prod",
            Commands::Status { json: false } => "/status",
            Commands::Status { json: true } => "/status.json",
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(url).send().await?;
    print_response(res, matches!(cli.command, Commands::Status { json: true })).await
}

async fn print_response(
    res: reqwest::Response,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: command server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprint!("{}", text);
        }
        return Ok(ExitCode::FAILURE);
    }

    if json {
        let value: Value = res.json().await?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", res.text().await?);
    }
    Ok(ExitCode::SUCCESS)
}

use base64::{engine::general_purpose, Engine as _};
use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "trans-cli")]
#[command(about = "Command-line client for the Trans gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(long, default_value = "v1")]
    api_version: String,

    /// API key sent as a bearer token
    #[arg(short, long, env = "APP_API_KEY")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway is up
    Health,
    /// Execute a Trans command
    Exec {
        /// Command name, e.g. transinfo
        name: String,
        /// Plain parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
        /// Blob parameter as key=path; the file is sent base64 encoded (repeatable)
        #[arg(short, long = "blob", value_parser = parse_pair)]
        blobs: Vec<(String, String)>,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}/api/{}", cli.url.trim_end_matches('/'), cli.api_version);

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    }

    match cli.command {
        Commands::Health => {
            let res = client
                .get(format!("{base}/healthcheck"))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Exec { name, params, blobs } => {
            let body = build_body(params, blobs)?;
            let res = client
                .post(format!("{base}/execute/{name}"))
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn build_body(
    params: Vec<(String, String)>,
    blobs: Vec<(String, String)>,
) -> Result<Value, std::io::Error> {
    let mut map = Map::new();
    for (key, value) in params {
        // Repeated keys become an array, which the gateway sends as
        // repeated parameters.
        match map.remove(&key) {
            None => {
                map.insert(key, Value::String(value));
            }
            Some(Value::Array(mut values)) => {
                values.push(Value::String(value));
                map.insert(key, Value::Array(values));
            }
            Some(previous) => {
                map.insert(key, Value::Array(vec![previous, Value::String(value)]));
            }
        }
    }

    if !blobs.is_empty() {
        let mut group = Map::new();
        for (key, path) in blobs {
            let bytes = std::fs::read(&path)?;
            group.insert(key, Value::String(general_purpose::STANDARD.encode(bytes)));
        }
        map.insert("blobs".to_string(), Value::Array(vec![Value::Object(group)]));
    }

    Ok(json!({ "params": map }))
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }
    if !status.is_success() {
        eprintln!("Error: gateway returned status {status}");
        std::process::exit(1);
    }
    Ok(())
}

use absentee_predictor::{config::Config, reports::ReportGenerator};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "absentee-cli")]
#[command(about = "Absentee Predictor CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "ABSENTEE_ENDPOINT", default_value = "http://localhost:5000")]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,

    /// Predict absent hours for one employee
    Predict {
        #[arg(short, long)]
        age: Option<f64>,

        #[arg(short, long)]
        length_service: Option<f64>,

        /// Extra record attribute, e.g. DepartmentName=Stores (repeatable)
        #[arg(short, long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, Value)>,

        /// Read the whole record from a JSON file; flags override its values
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List the risk cluster labels
    Clusters,

    /// Describe the loaded models
    Model,

    /// Render the chart report locally
    Report {
        /// Source CSV dataset
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Output directory for the charts
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of age histogram bins
        #[arg(short, long)]
        bins: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Health => {
            let body = get_json(&client, &format!("{}/health", cli.endpoint)).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Predict {
            age,
            length_service,
            fields,
            file,
        } => {
            let record = build_record(age, length_service, fields, file)?;

            let response = client
                .post(format!("{}/predict", cli.endpoint))
                .json(&record)
                .send()
                .await
                .with_context(|| format!("request to {} failed", cli.endpoint))?;

            let status = response.status();
            let body: Value = response.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            if !status.is_success() {
                bail!("prediction rejected with status {status}");
            }
        }

        Commands::Clusters => {
            let body = get_json(&client, &format!("{}/v1/clusters", cli.endpoint)).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Model => {
            let body = get_json(&client, &format!("{}/v1/model", cli.endpoint)).await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }

        Commands::Report {
            dataset,
            output,
            bins,
        } => {
            let mut config = Config::load().unwrap_or_default().reports;
            if let Some(dataset) = dataset {
                config.dataset_path = dataset;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(bins) = bins {
                config.histogram_bins = bins;
            }

            let summary = tokio::task::spawn_blocking(move || {
                ReportGenerator::from_config(&config).generate()
            })
            .await??;

            println!(
                "Rendered {} charts from {} rows in {}ms:",
                summary.files.len(),
                summary.rows,
                summary.duration_ms
            );
            for path in &summary.files {
                println!("  - {}", path.display());
            }
        }
    }

    Ok(())
}

async fn get_json(client: &Client, url: &str) -> anyhow::Result<Value> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;
    Ok(response.json().await?)
}

fn build_record(
    age: Option<f64>,
    length_service: Option<f64>,
    fields: Vec<(String, Value)>,
    file: Option<PathBuf>,
) -> anyhow::Result<Value> {
    let mut record = match file {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            match serde_json::from_str(&raw)? {
                Value::Object(map) => map,
                _ => bail!("{} must contain a JSON object", path.display()),
            }
        }
        None => Map::new(),
    };

    for (key, value) in fields {
        record.insert(key, value);
    }
    if let Some(age) = age {
        record.insert("Age".to_string(), json!(age));
    }
    if let Some(length_service) = length_service {
        record.insert("LengthService".to_string(), json!(length_service));
    }

    Ok(Value::Object(record))
}

/// Parse `KEY=VALUE`; finite numbers and booleans keep their JSON type
fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {raw:?}"));
    }

    let value = value.trim();
    let value = if let Some(n) = value.parse::<f64>().ok().filter(|n| n.is_finite()) {
        json!(n)
    } else if let Ok(b) = value.parse::<bool>() {
        json!(b)
    } else {
        json!(value)
    };
    Ok((key.to_string(), value))
}

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use odds_terminal::artifact::Artifact;
use odds_terminal::fake_rows::generate_raw_rows;
use odds_terminal::schema::Column;
use odds_terminal::transform::{RawRecord, transform_collection};

const DEFAULT_SEED: u64 = 26;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "odds_terminal=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let out = parse_path_arg("--out").context("missing --out <artifact.json>")?;
    let (label, raws) = match (parse_path_arg("--input"), parse_value_arg::<usize>("--demo")) {
        (Some(input), None) => {
            let raw = fs::read_to_string(&input)
                .with_context(|| format!("read {}", input.display()))?;
            let value: Value = serde_json::from_str(&raw)
                .with_context(|| format!("parse {}", input.display()))?;
            (input.display().to_string(), raw_records(value)?)
        }
        (None, Some(n)) => {
            let seed = parse_value_arg::<u64>("--seed").unwrap_or(DEFAULT_SEED);
            (format!("demo({n}, seed {seed})"), generate_raw_rows(n, seed))
        }
        (Some(_), Some(_)) => return Err(anyhow!("pass either --input or --demo, not both")),
        (None, None) => return Err(anyhow!("missing --input <raw.json> or --demo <n>")),
    };

    let started = Instant::now();
    let raw_count = raws.len();
    let rows = transform_collection(raws)?;
    let artifact = Artifact::build(rows);
    artifact.save(&out)?;

    let settled = artifact
        .rows
        .iter()
        .filter(|r| !r.get(Column::FullTime).is_empty())
        .count();
    println!("Odds ingest complete");
    println!("Source: {label}");
    println!("Artifact: {}", out.display());
    println!("Rows: {raw_count} raw -> {} canonical", artifact.rows.len());
    println!("With full-time score: {settled}");
    println!("Schema version: {}", artifact.schema_version);
    println!("Elapsed: {} ms", started.elapsed().as_millis());
    Ok(())
}

fn raw_records(value: Value) -> Result<Vec<RawRecord>> {
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => return Err(anyhow!("expected a \"data\" array in raw dump")),
        },
        _ => return Err(anyhow!("raw dump must be an array or an object with \"data\"")),
    };
    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| match row {
            Value::Array(fields) => Ok(fields),
            _ => Err(anyhow!("raw row {idx} is not an array")),
        })
        .collect()
}

fn parse_path_arg(flag: &str) -> Option<PathBuf> {
    parse_raw_arg(flag).map(PathBuf::from)
}

fn parse_value_arg<T: std::str::FromStr>(flag: &str) -> Option<T> {
    parse_raw_arg(flag).and_then(|raw| raw.parse::<T>().ok())
}

fn parse_raw_arg(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

/// Health Ingest CLI - writes manual entries, device bundles and subjective events
///
/// Usage:
///   health-ingest [--data-dir <dir>] manual 2025-02-10 stress=7 caffeine_time=16:30
///   health-ingest device 2025-02-10 --file bundle.json
///   health-ingest event 2025-02-10 --tag work "Deadline pressure all afternoon"
///   health-ingest show 2025-02-10
///   health-ingest list
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use health_insight_ingestion::{
    normalize_device_bundle, parse_day_key, EventLog, JsonDayStore, JsonEventLog, RecordStore,
};
use health_insight_schemas::{DayKey, Fields, RecordSource};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "health-ingest")]
#[command(about = "Store daily health data and subjective events")]
struct Args {
    /// Directory holding daily/, subjective_events.json and global_patterns.json
    #[arg(long, short, env = "HEALTH_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge manual key=value entries into a day (existing values are kept)
    Manual {
        date: String,
        #[arg(required = true)]
        entries: Vec<String>,
    },
    /// Merge a wearable daily bundle (JSON file) into a day
    Device {
        date: String,
        #[arg(long, short)]
        file: PathBuf,
    },
    /// Append a subjective event
    Event {
        date: String,
        #[arg(long = "tag", short)]
        tags: Vec<String>,
        #[arg(required = true)]
        body: Vec<String>,
    },
    /// Print the stored record for a day
    Show { date: String },
    /// List stored dates
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    info!("Data directory: {}", args.data_dir.display());

    match args.command {
        Command::Manual { date, entries } => {
            let date = parse_date(&date)?;
            let mut fragment = Fields::new();
            for entry in &entries {
                let (key, value) = parse_assignment(entry)?;
                fragment.insert(key, value);
            }
            let mut store = JsonDayStore::open(&args.data_dir)?;
            let record = store.upsert_merge(&date, RecordSource::Manual, fragment)?;
            print_json(&record)
        }
        Command::Device { date, file } => {
            let date = parse_date(&date)?;
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading device bundle {}", file.display()))?;
            let bundle: Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing device bundle {}", file.display()))?;
            let fragment = normalize_device_bundle(&bundle);
            if fragment.is_empty() {
                bail!("device bundle {} contained no recognised metrics", file.display());
            }
            let mut store = JsonDayStore::open(&args.data_dir)?;
            let record = store.upsert_merge(&date, RecordSource::Device, fragment)?;
            print_json(&record)
        }
        Command::Event { date, tags, body } => {
            let date = parse_date(&date)?;
            let mut log = JsonEventLog::open(&args.data_dir);
            let event = log.append(&date, tags, &body.join(" "))?;
            print_json(&event)
        }
        Command::Show { date } => {
            let date = parse_date(&date)?;
            let store = JsonDayStore::open(&args.data_dir)?;
            match store.get(&date)? {
                Some(record) => print_json(&record),
                None => bail!("no record for {}", date),
            }
        }
        Command::List => {
            let store = JsonDayStore::open(&args.data_dir)?;
            let dates = store.list_all()?;
            for date in &dates {
                println!("{}", date);
            }
            info!("{} days stored", dates.len());
            Ok(())
        }
    }
}

fn parse_date(raw: &str) -> Result<DayKey> {
    parse_day_key(raw).context("expected a date as YYYY-MM-DD")
}

/// `key=value`; the value is read as JSON when it parses, otherwise kept as a string.
fn parse_assignment(entry: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = entry.split_once('=') else {
        bail!("expected key=value, got {:?}", entry);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in {:?}", entry);
    }
    let raw = raw.trim();
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

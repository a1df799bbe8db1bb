//! LineKV CLI
//!
//! Command-line interface for inspecting and editing a LineKV data file.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use linekv::{Config, ErrorKind, Store, TailPolicy, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// LineKV CLI
#[derive(Parser, Debug)]
#[command(name = "linekv")]
#[command(about = "Embedded key-value store on a single append-only file")]
#[command(version)]
struct Args {
    /// Data file
    #[arg(short, long, default_value = "./linekv.db")]
    file: PathBuf,

    /// Cut a partial final row off the data file instead of refusing to open
    #[arg(long)]
    truncate_tail: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay the data file and report, without modifying it
    Check,

    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that open the store
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key, with or without a value
    Put {
        /// The key to set
        key: String,

        /// The value to set (omit for a key-only entry)
        value: Option<String>,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List every live key
    Keys,

    /// Print the number of live keys
    Count,

    /// Rewrite the data file with live rows only
    Compact,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> linekv::Result<ExitCode> {
    let tail_policy = if args.truncate_tail {
        TailPolicy::Truncate
    } else {
        TailPolicy::Fail
    };
    let config = Config::builder()
        .path(&args.file)
        .tail_policy(tail_policy)
        .build();

    match args.command {
        Commands::Check => check(&config),
        Commands::Store(command) => execute(Store::open(config)?, command),
    }
}

fn check(config: &Config) -> linekv::Result<ExitCode> {
    let result = linekv::store::verify(&config.path, &config.format)?;
    println!("rows:        {}", result.rows_replayed);
    println!("tombstones:  {}", result.tombstones);
    println!("live keys:   {}", result.live_keys);
    println!("end offset:  {}", result.end_offset);
    println!("partial tail bytes: {}", result.partial_tail_bytes);
    Ok(ExitCode::SUCCESS)
}

fn execute(store: Store, command: StoreCommand) -> linekv::Result<ExitCode> {
    let code = match command {
        StoreCommand::Get { key } => match store.get(key.as_bytes()) {
            Ok(Value::Bytes(value)) => {
                println!("{}", String::from_utf8_lossy(&value));
                ExitCode::SUCCESS
            }
            Ok(Value::KeyOnly) => {
                println!("(no value)");
                ExitCode::SUCCESS
            }
            Err(e) if e.kind() == ErrorKind::KeyNotFound => {
                println!("(not found)");
                ExitCode::from(1)
            }
            Err(e) => return Err(e),
        },
        StoreCommand::Put { key, value } => {
            store.put(key.as_bytes(), value.as_deref().map(str::as_bytes))?;
            ExitCode::SUCCESS
        }
        StoreCommand::Del { key } => {
            store.delete(key.as_bytes())?;
            ExitCode::SUCCESS
        }
        StoreCommand::Keys => {
            store.for_each_key(|key| {
                println!("{}", String::from_utf8_lossy(key));
                ControlFlow::Continue(())
            });
            ExitCode::SUCCESS
        }
        StoreCommand::Count => {
            println!("{}", store.len());
            ExitCode::SUCCESS
        }
        StoreCommand::Compact => {
            let store = store.compact()?;
            println!("{} keys, {} bytes", store.len(), store.offset());
            store.close()?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    store.close()?;
    Ok(code)
}

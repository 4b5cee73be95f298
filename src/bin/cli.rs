//! wellcurve CLI
//!
//! Runs the curve algorithms on logs stored as data files.
//!
//! A data file holds the mnemonic list on its first line, the unit list on
//! its second and one comma-separated row per further line, index first.
//! Every file is loaded into an in-memory store; the job outcome is printed
//! as JSON and transforms write the resulting log to `--output`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::{fmt, EnvFilter};

use wellcurve::analysis::{ConsistencyRequest, GapRequest, QcRequest};
use wellcurve::compare::CompareRequest;
use wellcurve::protocol::{encode_batch, read_data_file, split_list, write_data_file};
use wellcurve::store::{InMemoryStore, LogHeader, LogRef};
use wellcurve::transform::{OffsetRequest, SpliceRequest, TrimRequest};
use wellcurve::{
    Config, CurveError, Delta, Direction, Engine, IndexType, Job, JobContext, JobOutcome,
    OutcomeStatus, Result,
};

const WELL: &str = "cli-well";
const WELLBORE: &str = "cli-wellbore";

/// wellcurve CLI
#[derive(Parser, Debug)]
#[command(name = "wellcurve-cli")]
#[command(about = "Gap, QC, compare, splice, offset and trim jobs on well-log data files")]
#[command(version)]
struct Args {
    /// Index type of the input logs (depth or time)
    #[arg(long, default_value = "depth", global = true)]
    index_type: String,

    /// Input logs are indexed in decreasing order
    #[arg(long, global = true)]
    decreasing: bool,

    /// Delay before a failed write is retried
    #[arg(long, default_value = "60", global = true)]
    retry_delay_secs: u64,

    /// Maximum number of mismatches a comparison reports
    #[arg(long, default_value = "10000", global = true)]
    mismatch_cap: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report gaps of at least a given size
    Gaps {
        file: PathBuf,

        /// Smallest gap to report (depth units, or seconds for time logs)
        #[arg(long)]
        threshold: String,

        /// Comma-separated curves (default: all)
        #[arg(long)]
        mnemonics: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,
    },

    /// Minimum-data QC
    Qc {
        file: PathBuf,

        /// Required points per depth unit (per hour for time logs)
        #[arg(long)]
        density: Decimal,

        /// Largest tolerated gap (depth units, or seconds for time logs)
        #[arg(long)]
        gap: String,

        #[arg(long)]
        mnemonics: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,
    },

    /// Compare header boundaries with the data
    Check { file: PathBuf },

    /// Compare the data of two logs
    Compare { source: PathBuf, target: PathBuf },

    /// Splice logs into one
    Splice {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Name of the spliced log
        #[arg(long, default_value = "spliced")]
        name: String,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Shift curves by a constant
    Offset {
        file: PathBuf,

        /// Offset (depth units, or seconds for time logs)
        #[arg(long, allow_hyphen_values = true)]
        by: String,

        #[arg(long)]
        mnemonics: Option<String>,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        /// Back up the range first and restore it on failure
        #[arg(long)]
        backup: bool,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Delete data outside a new start/end
    Trim {
        file: PathBuf,

        #[arg(long)]
        start: Option<String>,

        #[arg(long)]
        end: Option<String>,

        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Input settings shared by every loaded file
struct Inputs {
    index_type: IndexType,
    direction: Direction,
}

impl Inputs {
    /// Load a data file as a log named after the file
    fn load(&self, store: &InMemoryStore, path: &Path, uid: &str) -> Result<LogRef> {
        let reader = BufReader::new(File::open(path)?);
        let batch = read_data_file(reader)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| uid.to_string());

        let log = LogRef::new(WELL, WELLBORE, uid);
        let header = LogHeader::from_batch(log.clone(), name, self.index_type, self.direction, &batch);
        store.load(header, &batch)?;
        tracing::debug!(path = %path.display(), rows = batch.len(), "Loaded data file");
        Ok(log)
    }

    /// Parse a size given in depth units, or seconds for time logs
    fn delta(&self, raw: &str) -> Result<Delta> {
        let value: Decimal = raw
            .trim()
            .parse()
            .map_err(|_| CurveError::Parse(format!("'{}' is not a number", raw)))?;
        match self.index_type {
            IndexType::Depth => Ok(Delta::depth(value, "")),
            IndexType::DateTime => Ok(Delta::time(seconds(value)?)),
        }
    }
}

fn seconds(value: Decimal) -> Result<TimeDelta> {
    let millis = (value * Decimal::from(1000)).round();
    let millis: i64 = millis
        .try_into()
        .map_err(|_| CurveError::Parse(format!("{} seconds is out of range", value)))?;
    Ok(TimeDelta::milliseconds(millis))
}

fn mnemonic_list(raw: &Option<String>) -> Vec<String> {
    raw.as_deref().map(split_list).unwrap_or_default()
}

/// Write a log of the store to a data file
fn export(store: &InMemoryStore, log: &LogRef, path: &Path) -> Result<()> {
    let data = store.log_data(log)?;
    let mut writer = BufWriter::new(File::create(path)?);
    write_data_file(&mut writer, &encode_batch(&data))?;
    tracing::info!(path = %path.display(), rows = data.len(), "Wrote output");
    Ok(())
}

async fn run(args: Args) -> Result<JobOutcome> {
    let inputs = Inputs {
        index_type: args.index_type.parse()?,
        direction: if args.decreasing {
            Direction::Decreasing
        } else {
            Direction::Increasing
        },
    };
    let config = Config::builder()
        .retry_delay(Duration::from_secs(args.retry_delay_secs))
        .mismatch_cap(args.mismatch_cap)
        .build();

    let store = Arc::new(InMemoryStore::new());
    let engine = Engine::new(config.clone(), store.clone());
    let ctx = JobContext::new();

    let outcome = match args.command {
        Commands::Gaps {
            file,
            threshold,
            mnemonics,
            start,
            end,
        } => {
            let log = inputs.load(&store, &file, "input")?;
            let request = GapRequest::new(log, inputs.delta(&threshold)?)
                .mnemonics(mnemonic_list(&mnemonics))
                .range(start, end);
            engine.execute(Job::Gaps(request), &ctx).await
        }

        Commands::Qc {
            file,
            density,
            gap,
            mnemonics,
            start,
            end,
        } => {
            let log = inputs.load(&store, &file, "input")?;
            let mut request = QcRequest::new(log, mnemonic_list(&mnemonics))
                .density(density)
                .range(start, end);
            request = match inputs.delta(&gap)? {
                Delta::Depth { value, .. } => request.depth_gap(value),
                Delta::Time(value) => request.time_gap(value),
            };
            engine.execute(Job::Qc(request), &ctx).await
        }

        Commands::Check { file } => {
            let log = inputs.load(&store, &file, "input")?;
            engine
                .execute(Job::Consistency(ConsistencyRequest::new(log)), &ctx)
                .await
        }

        Commands::Compare { source, target } => {
            let target_store = Arc::new(InMemoryStore::new());
            let source_log = inputs.load(&store, &source, "input")?;
            let target_log = inputs.load(&target_store, &target, "input")?;
            Engine::new(config, store.clone())
                .with_target(target_store)
                .execute(Job::CompareLogData(CompareRequest::new(source_log, target_log)), &ctx)
                .await
        }

        Commands::Splice {
            files,
            name,
            output,
        } => {
            let mut logs = Vec::with_capacity(files.len());
            for (position, file) in files.iter().enumerate() {
                logs.push(inputs.load(&store, file, &format!("input-{}", position + 1))?);
            }
            let request = SpliceRequest::new(logs, "spliced", name);
            let new_log = LogRef::new(WELL, WELLBORE, request.new_uid.clone());
            let outcome = engine.execute(Job::Splice(request), &ctx).await;
            if outcome.status != OutcomeStatus::Failed {
                export(&store, &new_log, &output)?;
            }
            outcome
        }

        Commands::Offset {
            file,
            by,
            mnemonics,
            start,
            end,
            backup,
            output,
        } => {
            let log = inputs.load(&store, &file, "input")?;
            let mut request = OffsetRequest::new(log.clone(), inputs.delta(&by)?)
                .mnemonics(mnemonic_list(&mnemonics))
                .range(start, end);
            if backup {
                request = request.with_backup();
            }
            let outcome = engine.execute(Job::Offset(request), &ctx).await;
            export(&store, &log, &output)?;
            outcome
        }

        Commands::Trim {
            file,
            start,
            end,
            output,
        } => {
            let log = inputs.load(&store, &file, "input")?;
            let outcome = engine
                .execute(Job::Trim(TrimRequest::new(log.clone(), start, end)), &ctx)
                .await;
            export(&store, &log, &output)?;
            outcome
        }
    };

    Ok(outcome)
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so stdout carries only the outcome
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wellcurve=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::info!("wellcurve CLI v{}", wellcurve::VERSION);

    let outcome = match run(args).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::error!("Failed to render outcome: {}", e);
            process::exit(1);
        }
    }

    if outcome.status == OutcomeStatus::Failed {
        process::exit(1);
    }
}

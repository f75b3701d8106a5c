use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use rds_snapshot::{
    copy_snapshot, delete_snapshot, lookup_snapshot, read_snapshot, Cancellation, ClientConfig,
    CopyRequest, DeleteOutcome, HttpSnapshotApi, LookupCriteria, RetryPolicy, SnapshotRecord,
    MIN_INTERVAL,
};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "rdsnap")]
#[command(about = "Copy, look up and delete RDS DB snapshots", long_about = None)]
#[command(version)]
struct Args {
    /// Snapshot API endpoint
    #[arg(long, default_value = "http://127.0.0.1:4566")]
    endpoint: String,

    /// Region to operate in
    #[arg(short, long, default_value = "us-east-1")]
    region: String,

    /// Per-request HTTP timeout (e.g. "30s")
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    request_timeout: Duration,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy a snapshot and wait until the copy is available
    Copy(CopyArgs),
    /// Find a single snapshot by instance or snapshot identifier
    Lookup(LookupArgs),
    /// Show the current state of a snapshot
    Read {
        /// Snapshot identifier
        id: String,
    },
    /// Delete a snapshot, retrying while it is in use
    Delete {
        /// Snapshot identifier
        id: String,

        /// Overall retry budget
        #[arg(long, default_value = "5m", value_parser = humantime::parse_duration)]
        timeout: Duration,

        /// Pause between attempts
        #[arg(long, default_value = "10s", value_parser = parse_interval)]
        retry_interval: Duration,
    },
}

#[derive(ClapArgs, Debug)]
struct CopyArgs {
    /// Identifier (or ARN) of the snapshot to copy
    #[arg(long)]
    source_snapshot_id: String,

    /// Identifier of the new snapshot
    #[arg(long)]
    target_snapshot_id: String,

    /// Region the source snapshot lives in
    #[arg(long)]
    source_region: String,

    #[arg(long)]
    destination_region: Option<String>,

    /// KMS key used to encrypt the copy
    #[arg(long)]
    kms_key_id: Option<String>,

    #[arg(long)]
    option_group_name: Option<String>,

    /// Pre-signed CopyDBSnapshot URL for cross-region copies
    #[arg(long)]
    presigned_url: Option<String>,

    /// Copy all tags from the source snapshot
    #[arg(long)]
    copy_tags: bool,

    /// Tags for the new snapshot (repeatable, KEY=VALUE)
    #[arg(long = "tag", value_parser = parse_tag)]
    tags: Vec<(String, String)>,

    /// How long to wait for the copy to become available
    #[arg(long, default_value = "30m", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// Pause between status checks
    #[arg(long, default_value = "30s", value_parser = parse_interval)]
    poll_interval: Duration,
}

#[derive(ClapArgs, Debug)]
struct LookupArgs {
    #[arg(long)]
    instance_id: Option<String>,

    #[arg(long)]
    snapshot_id: Option<String>,

    /// automated, manual, shared, public or awsbackup
    #[arg(long)]
    snapshot_type: Option<String>,

    /// Include snapshots shared with this account
    #[arg(long)]
    include_shared: bool,

    /// Include public snapshots
    #[arg(long)]
    include_public: bool,

    /// Pick the newest snapshot when several match
    #[arg(long)]
    most_recent: bool,
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

/// Parses a pause between attempts, refusing anything shorter than the minimum.
fn parse_interval(raw: &str) -> Result<Duration, String> {
    let interval = humantime::parse_duration(raw).map_err(|e| e.to_string())?;
    if interval < MIN_INTERVAL {
        return Err(format!(
            "interval must be at least {}",
            humantime::format_duration(MIN_INTERVAL)
        ));
    }
    Ok(interval)
}

impl CopyArgs {
    fn to_request(&self) -> CopyRequest {
        let mut request = CopyRequest::new(
            self.source_snapshot_id.as_str(),
            self.target_snapshot_id.as_str(),
            self.source_region.as_str(),
        );
        if let Some(region) = &self.destination_region {
            request = request.destination_region(region.as_str());
        }
        if let Some(key) = &self.kms_key_id {
            request = request.kms_key_id(key.as_str());
        }
        if let Some(group) = &self.option_group_name {
            request = request.option_group_name(group.as_str());
        }
        if let Some(url) = &self.presigned_url {
            request = request.pre_signed_url(url.as_str());
        }
        // Only an explicit --copy-tags is sent; leaving it off keeps the field unset.
        if self.copy_tags {
            request = request.copy_tags(true);
        }
        for (key, value) in &self.tags {
            request = request.tag(key.as_str(), value.as_str());
        }
        request
    }
}

impl From<LookupArgs> for LookupCriteria {
    fn from(args: LookupArgs) -> Self {
        LookupCriteria {
            db_instance_identifier: args.instance_id,
            db_snapshot_identifier: args.snapshot_id,
            snapshot_type: args.snapshot_type,
            include_shared: args.include_shared,
            include_public: args.include_public,
            most_recent: args.most_recent,
        }
    }
}

fn print_record(record: &SnapshotRecord) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

fn wait_spinner(id: &str) -> indicatif::ProgressBar {
    let spinner = indicatif::ProgressBar::new_spinner();
    if let Ok(style) = indicatif::ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg} | {elapsed_precise} elapsed")
    {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Waiting for snapshot {} to become available", id));
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

async fn run(args: Args, cancellation: Cancellation) -> anyhow::Result<()> {
    let config = ClientConfig {
        endpoint: args.endpoint,
        region: args.region,
        request_timeout: args.request_timeout,
    };
    let api = HttpSnapshotApi::new(&config).context("failed to configure snapshot API client")?;

    match args.command {
        Command::Copy(copy) => {
            let request = copy.to_request();
            let policy = RetryPolicy::new(copy.timeout, copy.poll_interval);
            let spinner = wait_spinner(&request.target_db_snapshot_identifier);

            let result = copy_snapshot(&api, &request, &policy, &cancellation).await;
            match &result {
                Ok(_) => spinner.finish_with_message("Snapshot copy is available"),
                Err(_) => spinner.finish_with_message("Snapshot copy failed"),
            }
            let record = result.with_context(|| {
                format!(
                    "Error copying RDS snapshot {} to {}",
                    request.source_db_snapshot_identifier, request.target_db_snapshot_identifier
                )
            })?;
            print_record(&record)
        }
        Command::Lookup(lookup) => {
            let criteria = LookupCriteria::from(lookup);
            let record = lookup_snapshot(&api, &criteria).await?;
            print_record(&record)
        }
        Command::Read { id } => match read_snapshot(&api, &id).await? {
            Some(record) => print_record(&record),
            None => {
                println!("Snapshot {} not found", id);
                Ok(())
            }
        },
        Command::Delete {
            id,
            timeout,
            retry_interval,
        } => {
            let policy = RetryPolicy::new(timeout, retry_interval);
            let outcome = delete_snapshot(&api, &id, &policy, &cancellation)
                .await
                .with_context(|| format!("Error deleting RDS snapshot {}", id))?;
            match outcome {
                DeleteOutcome::Deleted => info!("Deleted snapshot {}", id),
                DeleteOutcome::AlreadyGone => info!("Snapshot {} was already deleted", id),
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("rds_snapshot={},rdsnap={}", log_level, log_level))
        .with_writer(std::io::stderr)
        .init();

    let (cancel_handle, cancellation) = Cancellation::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancel_handle.cancel();
        }
    });

    match run(args, cancellation).await {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

use clap::{Parser, Subcommand};
use futures::StreamExt;
use noticebot::decisions::{Decision, DecisionLog};
use noticebot::learner::{GroupStatus, PatternLearner};
use noticebot::prelude::*;
use noticebot::{AuditLog, Determination};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Hearing-notice compliance checker for legislative committee action logs
#[derive(Parser, Debug)]
#[command(name = "noticebot")]
#[command(about = "Evaluate hearing notice compliance and manage clerical patterns")]
#[command(version)]
struct Args {
    /// Optional YAML config file (flags override file values)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate bill records and emit one JSON evaluation per line
    Evaluate {
        /// Directory of bill record JSON files
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Clerical pattern store path
        #[arg(long)]
        patterns: Option<PathBuf>,

        /// Audit log path for flagged cases
        #[arg(long)]
        audit: Option<PathBuf>,

        /// Minimum compliant reschedule notice in days
        #[arg(long)]
        min_notice_days: Option<i64>,

        /// Limit number of bills processed
        #[arg(long)]
        limit: Option<usize>,

        /// Only print flagged cases, not compliant bills
        #[arg(long)]
        flagged_only: bool,

        /// Read bill record paths from stdin instead of discovering files
        /// Useful for stdio pipelines: find ... | noticebot evaluate --stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Inspect or toggle clerical patterns
    Patterns {
        /// Clerical pattern store path
        #[arg(long)]
        patterns: Option<PathBuf>,

        #[command(subcommand)]
        command: PatternsCommand,
    },

    /// Record a human determination for a flagged bill
    Decide {
        /// Bill identifier, as it appears in the audit log
        bill_id: String,

        /// "clerical" or "violation"
        determination: Determination,

        /// Reviewer name for the ledger
        #[arg(long, default_value = "unknown")]
        reviewer: String,

        /// Free-form notes
        #[arg(long, default_value = "")]
        notes: String,

        /// Audit log to look the bill up in
        #[arg(long)]
        audit: Option<PathBuf>,

        /// Decision ledger path
        #[arg(long)]
        decisions: Option<PathBuf>,
    },

    /// Aggregate the decision ledger into clerical patterns
    Learn {
        /// Decision ledger path
        #[arg(long)]
        decisions: Option<PathBuf>,

        /// Clerical pattern store path
        #[arg(long)]
        patterns: Option<PathBuf>,

        /// Minimum clerical agreement ratio
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Minimum decisions per group
        #[arg(long)]
        min_sample_size: Option<usize>,

        /// Count superseded per-bill decisions instead of only the latest
        #[arg(long)]
        count_superseded: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PatternsCommand {
    /// List all patterns with their status
    List,
    /// Enable a pattern by id
    Enable { id: String },
    /// Disable a pattern by id
    Disable { id: String },
}

fn print_available_commands() {
    println!("Available commands:");
    println!("  evaluate   Evaluate bill records and emit one JSON evaluation per line");
    println!("  patterns   Inspect or toggle clerical patterns");
    println!("  decide     Record a human determination for a flagged bill");
    println!("  learn      Aggregate the decision ledger into clerical patterns");
}

fn base_builder(config_file: &Option<PathBuf>, data_dir: impl Into<PathBuf>) -> anyhow::Result<ConfigBuilder> {
    let mut builder = ConfigBuilder::new(data_dir);
    if let Some(path) = config_file {
        builder = builder.from_file(path)?;
    }
    Ok(builder)
}

async fn run_evaluate_command(config_file: Option<PathBuf>, cmd: Command) -> anyhow::Result<()> {
    let Command::Evaluate {
        data_dir,
        patterns,
        audit,
        min_notice_days,
        limit,
        flagged_only,
        stdin,
    } = cmd
    else {
        unreachable!()
    };

    let mut builder = base_builder(&config_file, data_dir)?;
    if let Some(path) = patterns {
        builder = builder.pattern_store(path);
    }
    if let Some(path) = audit {
        builder = builder.audit_log(path);
    }
    if let Some(days) = min_notice_days {
        builder = builder.min_notice_days(days);
    }
    if let Some(limit) = limit {
        builder = builder.limit(limit);
    }
    let config = if stdin {
        // The data directory is not read in stdin mode.
        builder.build_unchecked()
    } else {
        builder.build()?
    };

    let processor = NoticeProcessor::new(config)?;

    let mut flagged = 0usize;
    let mut total = 0usize;
    let mut failures = 0usize;

    if stdin {
        let stdin = io::stdin();
        let paths = stdin
            .lock()
            .lines()
            .map_while(|line| line.ok())
            .filter(|line| !line.trim().is_empty());

        let mut stream = processor.process_from_stdin(paths);
        while let Some(result) = stream.next().await {
            emit_evaluation(result, flagged_only, &mut total, &mut flagged, &mut failures)?;
        }
    } else {
        let mut stream = processor.process();
        while let Some(result) = stream.next().await {
            emit_evaluation(result, flagged_only, &mut total, &mut flagged, &mut failures)?;
        }
    }

    eprintln!("{} bills evaluated, {} flagged, {} failed", total, flagged, failures);
    if failures > 0 {
        anyhow::bail!("{} bills failed evaluation", failures);
    }
    Ok(())
}

fn emit_evaluation(
    result: Result<BillEvaluation>,
    flagged_only: bool,
    total: &mut usize,
    flagged: &mut usize,
    failures: &mut usize,
) -> anyhow::Result<()> {
    match result {
        Ok(evaluation) => {
            *total += 1;
            if evaluation.is_flagged() {
                *flagged += 1;
            }
            if !flagged_only || evaluation.is_flagged() {
                let json = serde_json::to_string(&evaluation)?;
                println!("{}", json);
            }
        }
        Err(e) => {
            *failures += 1;
            eprintln!("Error: {}", e);
        }
    }
    Ok(())
}

fn run_patterns_command(config_file: Option<PathBuf>, cmd: Command) -> anyhow::Result<()> {
    let Command::Patterns { patterns, command } = cmd else {
        unreachable!()
    };

    let config = {
        let mut builder = base_builder(&config_file, "data")?;
        if let Some(path) = patterns {
            builder = builder.pattern_store(path);
        }
        builder.build_unchecked()
    };

    match command {
        PatternsCommand::List => {
            let store = PatternStore::load(&config.pattern_store)?;
            for pattern in store.iter() {
                println!(
                    "{}  {}  confidence={:.2} samples={} {}",
                    pattern.id,
                    if pattern.enabled { "enabled " } else { "disabled" },
                    pattern.confidence,
                    pattern.sample_size,
                    pattern.name,
                );
            }
            if store.is_empty() {
                eprintln!("No patterns in {}", config.pattern_store.display());
            }
        }
        PatternsCommand::Enable { id } => {
            set_pattern_enabled(&config, &id, true)?;
        }
        PatternsCommand::Disable { id } => {
            set_pattern_enabled(&config, &id, false)?;
        }
    }
    Ok(())
}

fn set_pattern_enabled(config: &Config, id: &str, enabled: bool) -> anyhow::Result<()> {
    let mut store = PatternStore::load(&config.pattern_store)?;
    let pattern = store
        .get_mut(id)
        .ok_or_else(|| anyhow::anyhow!("No pattern with id {}", id))?;
    pattern.enabled = enabled;
    store.save(&config.pattern_store)?;
    println!("{} {}", id, if enabled { "enabled" } else { "disabled" });
    Ok(())
}

fn run_decide_command(config_file: Option<PathBuf>, cmd: Command) -> anyhow::Result<()> {
    let Command::Decide {
        bill_id,
        determination,
        reviewer,
        notes,
        audit,
        decisions,
    } = cmd
    else {
        unreachable!()
    };

    let config = {
        let mut builder = base_builder(&config_file, "data")?;
        if let Some(path) = audit {
            builder = builder.audit_log(path);
        }
        if let Some(path) = decisions {
            builder = builder.decision_log(path);
        }
        builder.build_unchecked()
    };

    // The signature comes from the most recent audit entry for the bill, so
    // the ledger stays self-contained for the learner.
    let records = AuditLog::open(&config.audit_log)?.load_all()?;
    let record = records
        .into_iter()
        .rev()
        .find(|r| r.bill_id == bill_id)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Bill {} not found in audit log {}",
                bill_id,
                config.audit_log.display()
            )
        })?;

    let decision = Decision {
        bill_id: bill_id.clone(),
        signature: record.signature,
        determination,
        reviewer,
        notes,
        decided_at: chrono::Utc::now(),
        applied_to_group: false,
    };
    DecisionLog::new(&config.decision_log).append(&decision)?;
    println!(
        "Recorded {:?} for {} in {}",
        decision.determination,
        bill_id,
        config.decision_log.display()
    );
    Ok(())
}

fn run_learn_command(config_file: Option<PathBuf>, cmd: Command) -> anyhow::Result<()> {
    let Command::Learn {
        decisions,
        patterns,
        min_confidence,
        min_sample_size,
        count_superseded,
    } = cmd
    else {
        unreachable!()
    };

    let config = {
        let mut builder = base_builder(&config_file, "data")?;
        if let Some(path) = decisions {
            builder = builder.decision_log(path);
        }
        if let Some(path) = patterns {
            builder = builder.pattern_store(path);
        }
        if let Some(confidence) = min_confidence {
            builder = builder.min_confidence(confidence);
        }
        if let Some(size) = min_sample_size {
            builder = builder.min_sample_size(size);
        }
        if count_superseded {
            builder = builder.count_superseded_decisions(true);
        }
        builder.build_unchecked()
    };

    let learner = PatternLearner::from_config(&config);
    let ledger = DecisionLog::new(&config.decision_log);
    let report = learner.run_on_files(&ledger, &config.pattern_store)?;

    for group in &report.groups {
        match &group.status {
            GroupStatus::EmittedNew { pattern_id } => {
                println!(
                    "emitted  {}  confidence={:.2} samples={}  {}",
                    pattern_id, group.confidence, group.sample_size, group.composite_key
                );
            }
            GroupStatus::UpdatedExisting { pattern_id, enabled } => {
                println!(
                    "updated  {}{}  confidence={:.2} samples={}  {}",
                    pattern_id,
                    if *enabled { "" } else { " (disabled)" },
                    group.confidence,
                    group.sample_size,
                    group.composite_key
                );
            }
            GroupStatus::SkippedInsufficientSample => {
                println!(
                    "skipped  samples={} (below minimum)  {}",
                    group.sample_size, group.composite_key
                );
            }
            GroupStatus::SkippedBelowConfidence => {
                println!(
                    "skipped  confidence={:.2} (below minimum)  {}",
                    group.confidence, group.composite_key
                );
            }
            GroupStatus::SkippedNoPriorValidNotice => {
                println!("skipped  no prior valid notice  {}", group.composite_key);
            }
        }
    }
    eprintln!(
        "{} emitted, {} updated, {} skipped",
        report.emitted(),
        report.updated(),
        report.skipped()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Some(cmd @ Command::Evaluate { .. }) => run_evaluate_command(args.config, cmd).await,
        Some(cmd @ Command::Patterns { .. }) => run_patterns_command(args.config, cmd),
        Some(cmd @ Command::Decide { .. }) => run_decide_command(args.config, cmd),
        Some(cmd @ Command::Learn { .. }) => run_learn_command(args.config, cmd),
        None => {
            print_available_commands();
            Ok(())
        }
    }
}

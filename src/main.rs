//! CLI entry point for `subjscan`.

use std::path::PathBuf;
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use subjscan::config::{self, Config};
use subjscan::model::ScanSummary;
use subjscan::store::StatsDb;
use subjscan::{pipeline, report, store};

#[derive(Parser)]
#[command(name = "subjscan", version, about = "Email subject-line length statistics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $SUBJSCAN_CONFIG or the user config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stats database file (overrides the config)
    #[arg(long, global = true, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan all configured mail sources into the stats database
    Scan {
        /// Archive directory searched for *.mbox, *.mbx, *.mbx.gz
        #[arg(long = "mbox-dir", value_name = "DIR")]
        mbox_dirs: Vec<PathBuf>,

        /// Single Maildir folder
        #[arg(long = "maildir", value_name = "DIR")]
        maildirs: Vec<PathBuf>,

        /// notmuch index path (requires the 'notmuch' build feature)
        #[arg(long, value_name = "DIR")]
        notmuch: Option<PathBuf>,

        /// Flat corpus directory (every file is one message)
        #[arg(long = "corpus-dir", value_name = "DIR")]
        corpus_dirs: Vec<PathBuf>,
    },
    /// Replace stored message-ids with sequential surrogate keys (irreversible)
    Anonymize,
    /// Print per-day aggregates for external plotting
    Report {
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config(cli.config.as_ref())?;
    if let Some(db) = cli.db {
        config.database.path = db;
    }

    let log_level = match cli.verbose {
        0 => config.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    setup_logging(&log_level, &config);

    match cli.command {
        Commands::Scan {
            mbox_dirs,
            maildirs,
            notmuch,
            corpus_dirs,
        } => {
            config.scan.mbox_dirs.extend(mbox_dirs);
            config.scan.maildirs.extend(maildirs);
            if notmuch.is_some() {
                config.scan.notmuch = notmuch;
            }
            config.scan.corpus_dirs.extend(corpus_dirs);
            cmd_scan(&config)
        }
        Commands::Anonymize => cmd_anonymize(&config),
        Commands::Report { json } => cmd_report(&config, json),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and a log file beside the cache dir.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::log_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "subjscan.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Run the full ingestion pipeline with a progress spinner.
fn cmd_scan(config: &Config) -> anyhow::Result<()> {
    let mut db = StatsDb::open(&config.database.path)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message("scanning...");

    let start = Instant::now();
    let summary = pipeline::run_scan(
        config,
        &mut db,
        Some(&|s: &ScanSummary| {
            pb.set_message(format!("{} emails, {}", s.recorded, s.date_range()));
            pb.tick();
        }),
    )?;
    pb.finish_and_clear();

    db.close()?;
    print_summary(config, &summary, start.elapsed());
    Ok(())
}

fn print_summary(config: &Config, summary: &ScanSummary, elapsed: std::time::Duration) {
    println!("  Database:        {}", config.database.path.display());
    println!("  Records stored:  {}", summary.recorded);
    println!("  Date range:      {}", summary.date_range());
    println!(
        "  Skipped:         {} (missing header {}, bad date {}, out of range {}, source errors {})",
        summary.skipped(),
        summary.missing_header,
        summary.bad_date,
        summary.out_of_range,
        summary.source_errors
    );
    println!("  Elapsed:         {:.1?}", elapsed);
}

/// One-shot surrogate-key rewrite of the stats table.
fn cmd_anonymize(config: &Config) -> anyhow::Result<()> {
    if !config.database.path.exists() {
        anyhow::bail!("Database not found: {}", config.database.path.display());
    }
    let mut db = StatsDb::open(&config.database.path)?;
    let rows = store::anonymize::strip_ids(&mut db)?;
    db.close()?;
    println!("  Anonymized {rows} row(s); original message-ids are gone.");
    Ok(())
}

/// Print the per-day aggregate as CSV or JSON.
fn cmd_report(config: &Config, json: bool) -> anyhow::Result<()> {
    if !config.database.path.exists() {
        anyhow::bail!("Database not found: {}", config.database.path.display());
    }
    let db = StatsDb::open(&config.database.path)?;
    let stats = report::daily_stats(&db)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        report::write_json(&stats, &mut out)?;
    } else {
        report::write_csv(&stats, &mut out)?;
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "subjscan", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

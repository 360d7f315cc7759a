//! s9y-migrate: collect a Serendipity blog into YAML records and replay them
//! into WordPress.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use s9y_migrate::archive::Site;
use s9y_migrate::collect::{CollectOptions, Collector};
use s9y_migrate::config::{Config, DEFAULT_CONFIG_FILE};
use s9y_migrate::http::UreqClient;
use s9y_migrate::oauth::handshake::{self, OUT_OF_BAND};
use s9y_migrate::oauth::Signer;
use s9y_migrate::replay::{ReplayOptions, Replayer};
use s9y_migrate::report::Archive;
use s9y_migrate::{store, Listener, PerfLogger, SpanCategories, TracingListener};
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "s9y-migrate")]
#[command(about = "Migrate a Serendipity blog into WordPress")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Verbosity level (-v: debug, -vv: debug with timing spans)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the archive pages and write one record per post
    Collect {
        /// Root URL of the Serendipity blog
        #[arg(short, long)]
        site: String,

        /// Number of archive pages
        #[arg(short, long, default_value = "8")]
        pages: u32,

        /// Output directory (default: start time, e.g. 20190102T030405)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not download media files
        #[arg(long)]
        no_media: bool,
    },

    /// Count the collected posts per month
    Report {
        /// Record directory
        directory: PathBuf,

        /// List the titles of one month, as YYYY-MM
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Obtain an OAuth access token and print the updated configuration
    Register,

    /// Replay a record directory into the configured blog
    Transfer {
        /// Create missing blog users instead of failing
        #[arg(long)]
        create_users: bool,

        /// Record directory
        directory: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = if verbose > 0 { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn perf_logger(verbose: u8) -> PerfLogger {
    if verbose > 1 {
        let listener = TracingListener::new(SpanCategories::ALL);
        PerfLogger::new(vec![Listener::new(Rc::new(listener))])
    } else {
        PerfLogger::silent()
    }
}

fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).with_context(|| format!("could not load configuration {}", path.display()))
}

fn parse_month(month: &str) -> Result<(i32, u32)> {
    let (year, month) = month
        .split_once('-')
        .with_context(|| format!("expected YYYY-MM, got {:?}", month))?;
    Ok((year.parse()?, month.parse()?))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let logger = perf_logger(cli.verbose);

    match cli.command {
        Commands::Collect {
            site,
            pages,
            output,
            no_media,
        } => {
            let mut options = CollectOptions::new(Site::new(&site), pages);
            if let Some(output) = output {
                options.directory = output;
            }
            options.download_media = !no_media;
            let summary = Collector::new(UreqClient::new(), &logger)
                .collect(&options)
                .context("collection failed")?;
            tracing::info!(
                directory = %options.directory.display(),
                posts = summary.posts,
                comments = summary.comments,
                media = summary.media,
                authors = summary.authors,
                "collection finished"
            );
        }
        Commands::Report { directory, month } => {
            let records = store::load_records(&directory)
                .with_context(|| format!("could not load {}", directory.display()))?;
            let archive = Archive::new(&records);
            for year in archive.summary() {
                println!("Year {}:", year.year);
                for count in year.months {
                    println!("\t{}: {}", count.month, count.posts);
                }
            }
            if let Some(month) = month {
                let (year, month) = parse_month(&month)?;
                for title in archive.titles(year, month) {
                    println!("{}", title);
                }
            }
        }
        Commands::Register => {
            let config = load_config(&cli.config)?;
            let callback = config.oauth_callback.as_deref().unwrap_or_default();
            if callback != OUT_OF_BAND {
                bail!("oauthCallback missing from config or not 'oob'");
            }
            let signer = Signer::new(config.credential());
            let stdin = io::stdin();
            let credential = handshake::authorize(
                &UreqClient::new(),
                &signer,
                config.site(),
                callback,
                stdin.lock(),
                io::stdout(),
            )
            .context("registration failed")?;
            let updated = config.with_credential(&credential);
            println!("Updated config:");
            println!("{}", "-".repeat(72));
            print!("{}", updated.to_yaml()?);
            println!("{}", "-".repeat(72));
        }
        Commands::Transfer {
            create_users,
            directory,
        } => {
            let config = load_config(&cli.config)?;
            let options = ReplayOptions {
                directory,
                create_users,
                comment_email: config.comment_email().to_string(),
            };
            let signer = Signer::new(config.credential());
            let summary = Replayer::new(UreqClient::new(), signer, config.site(), &logger)
                .run(&options)
                .context("transfer failed")?;
            tracing::info!(
                posts = summary.posts,
                comments = summary.comments,
                categories = summary.created_categories,
                users = summary.created_users,
                "transfer finished"
            );
        }
    }
    Ok(())
}

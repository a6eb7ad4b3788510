use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;

use pkapt::cache::{Cache, SnapshotCache};
use pkapt::error::{ErrorKind, Outcome};
use pkapt::filter::FilterSet;
use pkapt::index::MemoryIndex;
use pkapt::package::PackageId;
use pkapt::session::{Emitter, QuerySession, ResultStatus};

/// pkapt - package query backend
///
/// Answers name/details searches, lists pending upgrades and resolves
/// package ids against a package snapshot file.
///
/// Examples:
///   pkapt --snapshot packages.json search-name vim
///   pkapt --snapshot packages.json search-details "text editor" --filters ~devel
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Package snapshot file (JSON array of package records; also via
    /// PKAPT_SNAPSHOT)
    #[arg(
        long = "snapshot",
        short = 's',
        env = "PKAPT_SNAPSHOT",
        value_name = "PATH",
        global = true
    )]
    pub snapshot: Option<PathBuf>,

    /// Visibility filters as a ';'-separated token ("none" disables)
    #[arg(long = "filters", value_name = "FILTERS", default_value = "none", global = true)]
    pub filters: String,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Search packages whose name contains a substring
    SearchName(SearchArgs),

    /// Search package details with a ranked full-text query
    SearchDetails(SearchArgs),

    /// List packages a would-upgrade pass marks for action
    GetUpdates,

    /// Resolve a package id to its metadata
    Describe(DescribeArgs),
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
    /// Search term or query text
    #[arg(value_name = "QUERY")]
    query: String,
}

#[derive(clap::Args, Debug)]
struct DescribeArgs {
    /// Package id in the form "name;version;arch;origin"
    #[arg(value_name = "PACKAGE_ID")]
    id: String,
}

/// Emitter that renders each signal as one line on stdout.
struct StdoutEmitter;

#[async_trait]
impl Emitter for StdoutEmitter {
    async fn on_result(&mut self, status: ResultStatus, id: &PackageId, summary: &str) {
        println!("package\t{}\t{}\t{}", status, id, summary);
    }

    async fn on_description(
        &mut self,
        id: &PackageId,
        group: &str,
        license: &str,
        description: &str,
        homepage: &str,
        size: u64,
    ) {
        println!(
            "description\t{}\t{}\t{}\t{}\t{}\t{}",
            id,
            group,
            license,
            description.replace('\n', "\\n"),
            homepage,
            size
        );
    }

    async fn on_error(&mut self, kind: ErrorKind, message: &str) {
        eprintln!("error\t{}\t{}", kind, message);
    }

    async fn on_finished(&mut self, outcome: Outcome) {
        println!("finished\t{}", outcome);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let snapshot = cli
        .snapshot
        .ok_or_else(|| anyhow::anyhow!("No snapshot file given (--snapshot or PKAPT_SNAPSHOT)"))?;
    let mut report = |pct: u32| log::debug!("Loading cache: {}%", pct);
    let cache = SnapshotCache::load(&snapshot, &mut report)?;
    let index = MemoryIndex::build(&cache.packages());
    let filters = FilterSet::parse(&cli.filters);

    let mut session = QuerySession::new(cache, index, StdoutEmitter);
    let outcome = match cli.command {
        Commands::SearchName(args) => session.search_by_name(&filters, &args.query).await,
        Commands::SearchDetails(args) => session.search_by_details(&filters, &args.query).await,
        Commands::GetUpdates => session.list_upgrades().await,
        Commands::Describe(args) => session.describe(&args.id).await,
    };

    if outcome == Outcome::Failed {
        std::process::exit(1);
    }
    Ok(())
}

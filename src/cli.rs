use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "driftless")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile declared state without spurious diffs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare a prior and a proposed record and show the real changes
    Plan(PlanArgs),

    /// Run a paginated query and print the assembled result
    Query(QueryArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Plan
// ============================================================================

#[derive(Args)]
pub struct PlanArgs {
    /// Record file holding the last-known attribute values (JSON object)
    pub prior: PathBuf,

    /// Record file holding the proposed attribute values (JSON object)
    pub proposed: PathBuf,

    /// Field ignored when comparing list elements (default: id)
    #[arg(long)]
    pub identity_field: Option<String>,

    /// Match list elements by identity instead of position
    #[arg(long)]
    pub match_by_id: bool,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// Query
// ============================================================================

#[derive(Args)]
pub struct QueryArgs {
    /// Query text, or @FILE to read it from a file
    pub query: String,

    /// GraphQL endpoint
    #[arg(short, long, env = "DRIFTLESS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Include removed records
    #[arg(long)]
    pub include_removed: bool,

    /// Maximum number of pages to fetch (values below 1 are treated as 1)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub max_pages: Option<i64>,

    /// Per-call deadline in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

impl QueryArgs {
    /// Page ceiling from `--max-pages`, clamped to at least one page
    pub fn page_ceiling(&self) -> Option<u32> {
        self.max_pages
            .map(|n| u32::try_from(n.max(1)).unwrap_or(u32::MAX))
    }
}

// ============================================================================
// Config
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,
}

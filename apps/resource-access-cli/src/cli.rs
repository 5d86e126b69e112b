use std::path::PathBuf;

use clap::{Parser, Subcommand};
use resource_access_sdk::Verb;

#[derive(Parser, Debug)]
#[command(name = "rac", version)]
#[command(
    about = "Resolve hrefs, filters and requests against a resource access configuration",
    long_about = None
)]
pub struct Cli {
    /// YAML configuration file (`RESOURCE_ACCESS_*` variables override it)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse an href into its address
    Locate {
        /// Absolute URL, prefixed path or bare path fragment
        href: String,
    },

    /// Compile filter clauses against a schema type
    Filter {
        /// Type the clauses apply to, e.g. `Vm`
        #[arg(long = "type")]
        type_name: String,

        /// Clauses in order; prefix with `or ` to OR a clause in
        #[arg(required = true)]
        clauses: Vec<String>,
    },

    /// Prepare a request into an operation descriptor
    Resolve {
        #[arg(long)]
        verb: Verb,

        #[arg(long)]
        path: String,

        /// JSON request body
        #[arg(long)]
        body: Option<String>,

        #[arg(long = "filter")]
        filters: Vec<String>,

        /// Comma-separated attribute selection
        #[arg(long, value_delimiter = ',')]
        attributes: Vec<String>,

        /// Granted permission identifier; `*` grants everything
        #[arg(long = "grant", default_value = "*")]
        grants: Vec<String>,
    },
}

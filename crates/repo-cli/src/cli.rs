//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Maven Mock Repository - browse the tree a repository configuration serves
#[derive(Parser, Debug)]
#[command(name = "mrm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub source: SourceArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the served repositories come from.
///
/// Without `--config` or `--repository`, `mrm.toml` (or `.yaml`, `.yml`,
/// `.json`) is looked up in the current directory and its ancestors.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceArgs {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "MRM_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Serve a repository directory read-only; may be repeated
    #[arg(
        short = 'r',
        long = "repository",
        global = true,
        value_name = "DIR",
        conflicts_with = "config"
    )]
    pub repositories: Vec<PathBuf>,

    /// Do not serve .md5/.sha1 checksum files
    #[arg(long, global = true)]
    pub no_digest: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List a directory
    Ls {
        /// Repository path
        #[arg(default_value = "/")]
        path: String,

        /// Show size and modification time
        #[arg(short, long)]
        long: bool,
    },

    /// Write a file's content to stdout
    Cat {
        /// Repository path of the file
        path: String,
    },

    /// Show what a path resolves to
    Stat {
        /// Repository path
        path: String,
    },

    /// Print the tree below a directory
    ///
    /// Examples:
    ///   mrm tree                     # Everything
    ///   mrm tree /org/acme -d 2      # Two levels below org/acme
    Tree {
        /// Repository path
        #[arg(default_value = "/")]
        path: String,

        /// Maximum depth to descend
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Store a local file at a repository path
    ///
    /// Only writable repositories (`hosted`, `memory`) accept files, and only
    /// at paths that name an artifact, a metadata document or the archetype
    /// catalog.
    Put {
        /// Repository path to store at
        path: String,

        /// Local file to upload
        file: PathBuf,
    },
}

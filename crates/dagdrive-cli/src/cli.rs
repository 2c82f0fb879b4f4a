use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dagdrive",
    about = "Path-addressable storage on a content-addressed Merkle-DAG",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Daemon API address, e.g. localhost:5001
    #[arg(long, global = true)]
    pub addr: Option<String>,

    /// Storage root, e.g. /ipns/local/docker-registry
    #[arg(long, global = true)]
    pub root: Option<String>,

    /// TOML file with `addr` and `root`
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the content at a path
    Get(PathArgs),
    /// Store content at a path, replacing it
    Put(PutArgs),
    /// Keep the first N bytes at a path and append new content
    Append(AppendArgs),
    /// Stream content from an offset
    Cat(CatArgs),
    /// Show metadata for a path
    Stat(PathArgs),
    /// List the children of a path
    Ls(PathArgs),
    /// Move an object to a new path
    Mv(MoveArgs),
    /// Delete an object and everything below it
    Rm(PathArgs),
    /// Show the driver configuration and resolved root
    Info,
}

#[derive(Args)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub path: String,
    /// Read content from a file instead of stdin
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct AppendArgs {
    pub path: String,
    #[arg(long)]
    pub offset: u64,
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct CatArgs {
    pub path: String,
    #[arg(long, default_value = "0")]
    pub offset: u64,
}

#[derive(Args)]
pub struct MoveArgs {
    pub source: String,
    pub dest: String,
}

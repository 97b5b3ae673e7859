// Mon Jul 27 2026 - Alex

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ctype-oracle")]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "C type-layout and structural-equivalence oracle", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute layouts for every type in one or more declaration feeds
    Layout(LayoutArgs),
    /// Compare two independently-sourced type graphs
    Compare(CompareArgs),
    /// Run every fixture directory of a corpus and tally the verdicts
    Check(CheckArgs),
    /// Print the resolved type arena of a feed
    Dump(DumpArgs),
}

#[derive(Parser, Debug)]
pub struct LayoutArgs {
    /// Declaration feeds (one per translation unit) or a *.graph.json dump
    #[arg(required = true)]
    pub feeds: Vec<PathBuf>,

    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target model JSON; defaults to natural-alignment LP64
    #[arg(long)]
    pub target: Option<PathBuf>,

    #[arg(long)]
    pub packed: bool,

    /// Restrict the listing to these type names
    #[arg(short = 't', long = "type")]
    pub types: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Left-side feeds (typically source-derived)
    #[arg(long, required = true, num_args = 1..)]
    pub left: Vec<PathBuf>,

    /// Right-side feeds (typically debug-info-derived)
    #[arg(long, required = true, num_args = 1..)]
    pub right: Vec<PathBuf>,

    /// Roots to compare; defaults to every name declared on both sides
    #[arg(short, long)]
    pub root: Vec<String>,

    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Require field names to match, not just shapes
    #[arg(long)]
    pub strict_names: bool,

    /// Cross-check computed sizes, alignments and offsets
    #[arg(long)]
    pub check_layout: bool,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Corpus directory; each subdirectory holds source*.json and debug*.json
    pub corpus: PathBuf,

    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub target: Option<PathBuf>,

    #[arg(long)]
    pub strict_names: bool,

    #[arg(long)]
    pub check_layout: bool,

    #[arg(long, default_value = "0")]
    pub threads: usize,

    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Parser, Debug)]
pub struct DumpArgs {
    #[arg(required = true)]
    pub feeds: Vec<PathBuf>,

    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl LayoutArgs {
    pub fn validate(&self) -> Result<(), String> {
        for feed in &self.feeds {
            if !feed.exists() {
                return Err(format!("Feed does not exist: {}", feed.display()));
            }
        }
        Ok(())
    }
}

impl CompareArgs {
    pub fn validate(&self) -> Result<(), String> {
        for feed in self.left.iter().chain(self.right.iter()) {
            if !feed.exists() {
                return Err(format!("Feed does not exist: {}", feed.display()));
            }
        }
        Ok(())
    }
}

impl CheckArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.corpus.is_dir() {
            return Err(format!("Corpus is not a directory: {}", self.corpus.display()));
        }
        Ok(())
    }
}

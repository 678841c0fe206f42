use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Clone, Debug, Parser)]
#[command(name = "selfup", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "c", name = "check", about = "Check whether a newer version is published")]
    Check(Target),
    #[command(alias = "up", name = "update", about = "Download, verify and launch the latest installer")]
    Update(UpdateArg),
    #[command(name = "compare", about = "Compare two n.n.n.n versions")]
    Compare(CompareArg),
}

#[derive(Clone, Debug, Args)]
pub struct Target {
    /// Updater configuration file.
    #[arg(short, long, default_value = "selfup.toml")]
    pub config:       PathBuf,
    /// Override `manifest_url` from the configuration.
    #[arg(long)]
    pub manifest_url: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct UpdateArg {
    #[command(flatten)]
    pub target: Target,
    /// Install even when the installed version is not older.
    #[arg(short, long)]
    pub force:  bool,
}

#[derive(Clone, Debug, Args)]
pub struct CompareArg {
    pub left:  String,
    pub right: String,
}

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "cf-cli")]
#[command(about = "Chat flow terminal runner")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Chat(ChatArgs),
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ChatArgs {
    #[arg(long = "flow-dir")]
    pub(crate) flow_dir: String,
    #[arg(long = "settings")]
    pub(crate) settings: Option<String>,
    /// Log filter directives, e.g. `cf_runtime=debug`.
    #[arg(long = "log")]
    pub(crate) log: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "flow-dir")]
    pub(crate) flow_dir: String,
}

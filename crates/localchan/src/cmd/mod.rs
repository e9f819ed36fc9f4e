use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod endpoint;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the transport address a channel name resolves to.
    Endpoint(EndpointArgs),
    /// Dial a channel, send one JSON request and print the response.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Endpoint(args) => endpoint::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EndpointArgs {
    /// Channel name.
    pub name: String,
    /// Sub-channel qualifier, appended as `<name>_<qualifier>`.
    #[arg(long, short = 'q')]
    pub qualifier: Option<String>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Channel name to dial.
    pub name: String,
    /// Sub-channel qualifier, appended as `<name>_<qualifier>`.
    #[arg(long, short = 'q')]
    pub qualifier: Option<String>,
    /// JSON request payload.
    #[arg(long)]
    pub json: String,
    /// Pause between connection attempts while the endpoint is not up (e.g. 100ms, 1s).
    #[arg(long, default_value = "100ms")]
    pub retry_interval: String,
    /// Give up after this many connection attempts.
    #[arg(long)]
    pub max_attempts: Option<u32>,
    /// Overall dial deadline, also applied to each read and write (e.g. 5s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

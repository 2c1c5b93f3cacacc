use std::{ffi::OsString, process::ExitCode, time::Duration};

use clap::{error::ErrorKind, Args, Parser, Subcommand};

use crate::{
    config::{LocatorCredentials, ReceptionistAddress, WorkerSettings},
    error::ERROR_EXIT_STATUS,
    strategy::ConnectStrategy,
};

/// Command line of the `external` worker, which can use either connect path.
#[derive(Parser, Debug)]
#[command(
    name = "external",
    author,
    version,
    about = "Connects an external worker to the simulation platform"
)]
pub struct ExternalCli {
    #[command(flatten)]
    pub tuning: TuningArgs,

    #[command(subcommand)]
    pub command: ExternalCommand,
}

#[derive(Subcommand, Debug)]
pub enum ExternalCommand {
    /// Connect directly to a receptionist endpoint.
    Receptionist(ReceptionistArgs),
    /// Connect through the locator service of a cloud deployment.
    Locator(LocatorArgs),
}

/// Command line of the `managed` worker, launched by the platform itself.
#[derive(Parser, Debug)]
#[command(
    name = "managed",
    author,
    version,
    about = "Connects a managed worker to the simulation platform"
)]
pub struct ManagedCli {
    #[command(flatten)]
    pub tuning: TuningArgs,

    #[command(subcommand)]
    pub command: ManagedCommand,
}

#[derive(Subcommand, Debug)]
pub enum ManagedCommand {
    /// Connect directly to a receptionist endpoint.
    Receptionist(ReceptionistArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReceptionistArgs {
    /// Hostname of the receptionist to connect to.
    pub hostname: String,

    /// Port of the receptionist.
    pub port: u16,

    /// Name of the worker assigned by the platform.
    pub worker_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct LocatorArgs {
    /// Hostname of the locator, optionally with `:port`.
    pub hostname: String,

    /// Name of the project to run.
    pub project_name: String,

    /// Name of the cloud deployment to join.
    pub deployment_id: String,

    /// Token used to log in through the locator.
    pub login_token: String,
}

#[derive(Args, Debug, Clone)]
pub struct TuningArgs {
    /// Maximum time a single poll waits for operations, in milliseconds.
    #[arg(long, global = true, default_value_t = 100)]
    pub poll_timeout_ms: u64,

    /// Time allowed for each connection attempt, in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    pub connect_timeout_secs: u64,
}

impl TuningArgs {
    pub fn settings(&self, worker_type: &str) -> WorkerSettings {
        WorkerSettings {
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            ..WorkerSettings::new(worker_type)
        }
    }
}

impl From<ReceptionistArgs> for ConnectStrategy {
    fn from(args: ReceptionistArgs) -> Self {
        ConnectStrategy::Receptionist(ReceptionistAddress {
            hostname: args.hostname,
            port: args.port,
            worker_id: args.worker_id,
        })
    }
}

impl From<LocatorArgs> for ConnectStrategy {
    fn from(args: LocatorArgs) -> Self {
        ConnectStrategy::Locator {
            hostname: args.hostname,
            credentials: LocatorCredentials {
                project_name: args.project_name,
                deployment_id: args.deployment_id,
                login_token: args.login_token,
            },
        }
    }
}

impl From<ExternalCommand> for ConnectStrategy {
    fn from(command: ExternalCommand) -> Self {
        match command {
            ExternalCommand::Receptionist(args) => args.into(),
            ExternalCommand::Locator(args) => args.into(),
        }
    }
}

impl From<ManagedCommand> for ConnectStrategy {
    fn from(command: ManagedCommand) -> Self {
        match command {
            ManagedCommand::Receptionist(args) => args.into(),
        }
    }
}

/// Parses `args`, printing usage to stdout on any argument error.
///
/// `Err` carries the exit code the process should return without connecting.
pub fn parse_args<P, I, T>(args: I) -> Result<P, ExitCode>
where
    P: Parser,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match P::try_parse_from(args) {
        Ok(cli) => Ok(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            Err(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprint!("{err}");
            println!("{}", P::command().render_long_help());
            Err(ExitCode::from(ERROR_EXIT_STATUS))
        }
    }
}

mod commands;
mod config;
mod environment;
mod tasks;
mod utils;
mod vsphere;

#[cfg(test)]
mod testing;

mod prelude {
    pub use crate::{commands::*, config::*, environment::*, tasks::*, utils::*, vsphere::*};
    pub use anyhow::{anyhow, bail, Context, Result};
    pub use colored::Colorize;
    pub use itertools::Itertools;
    pub use std::io::Write;

    #[cfg(test)]
    pub use indoc::indoc;

    #[cfg(test)]
    pub use pretty_assertions as pa;
}

use self::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use std::{io, process};
use tracing_subscriber::EnvFilter;

/// Prepares a vSphere virtual machine for migration: lowercases its name,
/// deletes its snapshots, makes its disks persistent and enables change block
/// tracking
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Exact (case-sensitive) name of the virtual machine
    vm_name: String,

    /// Path to the file with connection settings (`SERVER`, `USER`,
    /// `PASSWORD`); values missing from it are asked for interactively
    #[arg(short, long, default_value = ".env")]
    env_file: PathBuf,

    /// Runs application in a simulated safe-mode without applying any changes
    /// to the virtual machine
    #[arg(long)]
    dry_run: bool,

    /// Verifies the endpoint's TLS certificate (by default any certificate is
    /// accepted, since most endpoints present a self-signed one)
    #[arg(long)]
    verify_certs: bool,

    /// Delay between two polls of a running task
    #[arg(long, default_value = "1s")]
    poll_interval: humantime::Duration,

    /// How long to wait for a single task before giving up on it
    #[arg(long, default_value = "1h")]
    task_timeout: humantime::Duration,

    /// Prints more diagnostics to stderr (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,

        Err(err) => {
            _ = err.print();
            process::exit(usage_exit_code(&err));
        }
    };

    init_tracing(args.verbose);

    let cancellation = CancellationToken::default();

    {
        let cancellation = cancellation.clone();

        if let Err(err) = ctrlc::set_handler(move || cancellation.cancel()) {
            tracing::warn!("couldn't install the Ctrl-C handler: {}", err);
        }
    }

    let stdout = &mut io::stdout();
    let config = Config::load(&args.env_file, &mut TerminalPrompt, stdout)?;

    tracing::debug!(?config, "configuration loaded");

    // Ctrl-C doesn't abort a blocking read or request, so whatever was
    // pressed in the meantime gets noticed here
    ensure_not_interrupted(&cancellation)?;

    let mut vsphere = VsphereHttpClient::connect(&VsphereConnectOptions {
        server: &config.server,
        user: &config.user,
        password: &config.password,
        release: &config.release,
        verify_certs: args.verify_certs,
    })
    .with_context(|| format!("Couldn't connect to {}", config.server))?;

    let interrupted = ensure_not_interrupted(&cancellation);

    if interrupted.is_err() {
        let disconnect_result = vsphere
            .disconnect()
            .with_context(|| format!("Couldn't disconnect from {}", config.server));

        return interrupted.and(disconnect_result);
    }

    writeln!(stdout, "Connected to {}", config.server.as_str().bold())?;
    writeln!(stdout)?;

    let tasks = TaskWaiter::new(
        args.poll_interval.into(),
        args.task_timeout.into(),
        cancellation,
    );

    let vm_name = VsphereVmName::new(&args.vm_name);

    let cmd_result = if args.dry_run {
        writeln!(
            stdout,
            "{} --dry-run is active, no changes will be applied\n",
            "Note:".green(),
        )?;

        VsphereFakeClient::clone_from(&mut vsphere, &vm_name)
            .context("Couldn't inspect the endpoint")
            .and_then(|mut fake| {
                Prepare::new(&mut Environment {
                    stdout,
                    vsphere: &mut fake,
                    tasks,
                })
                .run(&vm_name)
            })
    } else {
        Prepare::new(&mut Environment {
            stdout,
            vsphere: &mut vsphere,
            tasks,
        })
        .run(&vm_name)
    };

    let disconnect_result = vsphere
        .disconnect()
        .with_context(|| format!("Couldn't disconnect from {}", config.server));

    cmd_result.and(disconnect_result)
}

fn ensure_not_interrupted(cancellation: &CancellationToken) -> Result<()> {
    if cancellation.is_cancelled() {
        bail!("Interrupted, not going any further");
    }

    Ok(())
}

/// Usage errors exit with `1`; `--help` and `--version` are not errors.
fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        1
    } else {
        0
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

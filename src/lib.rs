// src/lib.rs

pub mod cli;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod invoke;
pub mod logging;
pub mod orchestrator;
pub mod process;
pub mod registry;
pub mod resolver;
pub mod supervisor;
pub mod types;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::cli::CliArgs;
use crate::config::load_and_validate;

pub use crate::descriptor::{InvokeOptions, OtherOptions, Paths, ProcessDescriptor, SubCommand};
pub use crate::errors::ProcessError;
pub use crate::invoke::DataHandler;
pub use crate::orchestrator::Orchestrator;
pub use crate::registry::Registry;
pub use crate::supervisor::{CleanupHandler, ProcessHandle};
pub use crate::types::{ExecutionStrategy, LifecycleEvent, ProcessType, Signal, StdioMode};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - descriptor file loading
/// - registry + orchestrator
/// - one action launch with stdout/stderr forwarding
/// - Ctrl-C handling (kill with the configured signal)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let descriptors = load_and_validate(&config_path)
        .with_context(|| format!("loading descriptors from {}", config_path.display()))?;

    if args.dry_run {
        print_dry_run(&descriptors, &args.action);
        return Ok(());
    }

    let name = match (&args.name, descriptors.as_slice()) {
        (Some(name), _) => name.clone(),
        (None, [only]) => only.name.clone(),
        (None, _) => bail!(
            "{} declares {} processes; pick one with --name",
            config_path.display(),
            descriptors.len()
        ),
    };

    let orchestrator = Orchestrator::new(Registry::new());
    for descriptor in descriptors {
        let desc_name = descriptor.name.clone();
        if !orchestrator.register(descriptor) {
            warn!(name = %desc_name, "descriptor not registered");
        }
    }

    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<LifecycleEvent>();

    let data: DataHandler = Arc::new(|err, stdout, stderr| {
        if let Some(err) = err {
            error!(error = %err, "process reported an error");
        }
        if let Some(out) = stdout {
            let mut lock = std::io::stdout().lock();
            let _ = lock.write_all(&out).and_then(|_| lock.flush());
        }
        if let Some(out) = stderr {
            let _ = std::io::stderr().write_all(&out);
        }
    });
    let cleanup: CleanupHandler = Arc::new(move |event: LifecycleEvent, _: &ProcessDescriptor| {
        let _ = done_tx.send(event);
    });

    let running = orchestrator.execute_action(&name, &args.action, data, cleanup)?;
    info!(name = %name, action = %args.action, pid = ?running.pid(), "running; Ctrl-C to stop");

    tokio::select! {
        Some(event) = done_rx.recv() => {
            info!(name = %name, %event, "process finished");
        }
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl+C");
            }
            if !orchestrator.kill(&name, args.signal) {
                bail!("failed to deliver {} to '{}'", args.signal, name);
            }
            info!(name = %name, signal = %args.signal, "process killed");
        }
    }

    Ok(())
}

/// Simple dry-run output: print descriptors and how the action resolves.
fn print_dry_run(descriptors: &[ProcessDescriptor], action: &str) {
    println!("procvisor dry-run");
    println!();
    println!("processes ({}):", descriptors.len());
    for d in descriptors {
        println!("  - {}", d.name);
        println!("      type: {}", d.kind);
        println!("      strategy: {:?}", d.other.execution_strategy);
        if !d.exe.is_empty() {
            println!("      exe: {}", d.exe);
        }
        let actions: Vec<&str> = d.cmds.keys().map(String::as_str).collect();
        println!("      actions: {:?}", actions);
        if !d.other.env.is_empty() {
            println!("      env: {:?}", d.other.env);
        }
        match resolver::resolve(d, action) {
            Ok(inv) => println!("      {action}: {}", inv.command_line()),
            Err(e) => println!("      {action}: <{e}>"),
        }
    }
}

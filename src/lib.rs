// src/lib.rs

//! A minimal DAG executor.
//!
//! Build a [`WorkFlow`](engine::WorkFlow) of nodes connected by dependency
//! edges, [`start`](engine::WorkFlow::start) it, and
//! [`wait_done`](engine::RunningFlow::wait_done) until every exit path has
//! reached the end node.
//!
//! ```no_run
//! use dagwork::engine::{Completion, WorkFlow};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), dagwork::errors::FlowError> {
//! let mut flow: WorkFlow<String> = WorkFlow::new();
//! let fetch = flow.new_named_node("fetch", |url: &String| println!("fetch {url}"));
//! let parse = flow.new_named_node("parse", |_: &String| println!("parse"));
//! flow.add_start_node(fetch);
//! flow.add_edge(fetch, parse);
//! flow.connect_to_end(parse);
//!
//! let running = flow.start(CancellationToken::new(), "https://example.org".to_string())?;
//! assert_eq!(running.wait_done().await?, Completion::Finished);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{FlowFile, load_and_validate, parse_duration};
use crate::engine::Completion;
use crate::exec::{CommandEnv, build_workflow};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - flow file loading
/// - flow construction from the file
/// - Ctrl-C handling (cancels the flow)
/// - the optional deadline
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config;
    let flow_file = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&flow_file);
        return Ok(());
    }

    let deadline = match args.timeout.as_deref() {
        Some(s) => Some(parse_duration(s).map_err(|e| anyhow::anyhow!("--timeout: {e}"))?),
        None => flow_file.config.deadline()?,
    };

    let env = CommandEnv::new(config_root_dir(&config_path));

    // Ctrl-C → cancel the flow; running commands finish, nothing new starts.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            warn!("Ctrl+C received; cancelling flow");
            cancel.cancel();
        });
    }

    info!(tasks = flow_file.task.len(), ?deadline, "running flow");
    match execute_flow(&flow_file, env, cancel, deadline).await? {
        Completion::Finished => {
            info!("all tasks finished");
            Ok(())
        }
        Completion::Interrupted => bail!("flow interrupted before all tasks finished"),
    }
}

/// Build the flow described by `flow_file`, run it in `env` and wait for it.
///
/// With a `deadline` the flow is interrupted once it elapses and
/// `FlowError::DeadlineExceeded` is returned.
pub async fn execute_flow(
    flow_file: &FlowFile,
    env: CommandEnv,
    cancel: CancellationToken,
    deadline: Option<Duration>,
) -> errors::Result<Completion> {
    let workflow = build_workflow(flow_file)?;
    let running = workflow.start(cancel, env)?;

    let completion = match deadline {
        Some(deadline) => running.wait_done_timeout(deadline).await?,
        None => running.wait_done().await?,
    };
    Ok(completion)
}

/// Directory the commands run in.
///
/// - If the config path has a non-empty parent (e.g. "flows/Dagwork.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Dagwork.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print tasks, deps and commands.
fn print_dry_run(flow: &FlowFile) {
    println!("dagwork dry-run");
    println!("  config.on_task_panic = {:?}", flow.config.on_task_panic);
    if let Some(ref deadline) = flow.config.deadline {
        println!("  config.deadline = {deadline}");
    }
    println!();

    println!("tasks ({}):", flow.task.len());
    for (name, task) in flow.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
    }
    println!();
    println!("start: {:?}", flow.start_tasks());
    println!("end:   {:?}", flow.exit_tasks());

    debug!("dry-run complete (no execution)");
}

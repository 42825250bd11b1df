// src/exec/command.rs

//! Shell-command tasks.

use std::path::PathBuf;
use std::process::Command;

use tracing::{error, info};

use crate::engine::{InterruptHandle, Runnable};

/// Payload shared by every command task of a flow.
#[derive(Debug, Clone)]
pub struct CommandEnv {
    /// Directory the commands run in.
    pub workdir: PathBuf,
}

impl CommandEnv {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

/// Runs one shell command and fails the flow if it cannot be spawned or
/// exits unsuccessfully.
#[derive(Debug)]
pub struct CommandTask {
    name: String,
    cmd: String,
    flow: InterruptHandle,
}

impl CommandTask {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>, flow: InterruptHandle) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            flow,
        }
    }
}

impl Runnable<CommandEnv> for CommandTask {
    fn run(&self, env: &CommandEnv) {
        info!(task = %self.name, cmd = %self.cmd, "starting task process");

        let status = shell_command(&self.cmd).current_dir(&env.workdir).status();

        match status {
            Ok(status) if status.success() => {
                info!(task = %self.name, "task completed successfully");
            }
            Ok(status) => {
                let reason = match status.code() {
                    Some(code) => format!("task '{}' exited with code {}", self.name, code),
                    None => format!("task '{}' was terminated by a signal", self.name),
                };
                error!(task = %self.name, %reason, "task failed");
                self.flow.fail(reason);
            }
            Err(err) => {
                let reason = format!("spawning process for task '{}': {}", self.name, err);
                error!(task = %self.name, %reason, "task failed");
                self.flow.fail(reason);
            }
        }
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

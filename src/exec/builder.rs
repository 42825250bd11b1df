// src/exec/builder.rs

//! Turning a validated flow file into a runnable [`WorkFlow`].

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::FlowFile;
use crate::dag::NodeId;
use crate::engine::WorkFlow;
use crate::errors::{DagworkError, Result};
use crate::exec::command::{CommandEnv, CommandTask};

/// Build a flow with one [`CommandTask`] node per `[task.<name>]`.
///
/// - every `after = [..]` entry becomes an edge `dep -> task`
/// - tasks without `after` are start nodes
/// - tasks nothing depends on are connected to the end node
pub fn build_workflow(flow: &FlowFile) -> Result<WorkFlow<CommandEnv>> {
    let mut wf = WorkFlow::new().with_panic_policy(flow.config.on_task_panic);
    let handle = wf.interrupt_handle();

    let mut ids: BTreeMap<&str, NodeId> = BTreeMap::new();
    for (name, task) in flow.task.iter() {
        let id = wf.new_named_node(
            name.clone(),
            CommandTask::new(name.clone(), task.cmd.clone(), handle.clone()),
        );
        ids.insert(name.as_str(), id);
    }

    for (name, task) in flow.task.iter() {
        let to = lookup(&ids, name)?;
        for dep in task.after.iter() {
            let from = lookup(&ids, dep)?;
            wf.add_edge(from, to);
            debug!(from = %dep, to = %name, "added dependency edge");
        }
    }

    for name in flow.start_tasks() {
        wf.add_start_node(lookup(&ids, name)?);
    }

    for name in flow.exit_tasks() {
        wf.connect_to_end(lookup(&ids, name)?);
    }

    Ok(wf)
}

fn lookup(ids: &BTreeMap<&str, NodeId>, name: &str) -> Result<NodeId> {
    ids.get(name)
        .copied()
        .ok_or_else(|| DagworkError::ConfigError(format!("unknown task '{}'", name)))
}

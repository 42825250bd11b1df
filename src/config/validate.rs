// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{FlowFile, RawFlowFile};
use crate::errors::{DagworkError, Result};

impl TryFrom<RawFlowFile> for FlowFile {
    type Error = DagworkError;

    fn try_from(raw: RawFlowFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(FlowFile::new_unchecked(raw.config, raw.task))
    }
}

/// Check everything a flow file needs before a `WorkFlow` is built from it.
pub fn validate_config(cfg: &RawFlowFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_commands(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawFlowFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(DagworkError::ConfigError(
            "flow must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawFlowFile) -> Result<()> {
    // on_task_panic is validated during deserialization.
    if let Some(deadline) = cfg.config.deadline()? {
        if deadline.is_zero() {
            return Err(DagworkError::ConfigError(
                "[config].deadline must be greater than zero".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_task_commands(cfg: &RawFlowFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(DagworkError::ConfigError(format!(
                "task '{}' has an empty `cmd`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawFlowFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for (idx, dep) in task.after.iter().enumerate() {
            if !cfg.task.contains_key(dep) {
                return Err(DagworkError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(DagworkError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            // A repeated entry would become a second edge the dependency can
            // only ever satisfy once.
            if task.after[..idx].contains(dep) {
                return Err(DagworkError::ConfigError(format!(
                    "task '{}' lists '{}' more than once in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawFlowFile) -> Result<()> {
    // Edge direction: dep -> task, so `after = ["A"]` on B adds A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(DagworkError::DagCycle(format!(
            "cycle detected in task DAG involving task '{}'",
            cycle.node_id()
        ))),
    }
}

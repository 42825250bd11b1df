#![allow(dead_code)]

use std::collections::BTreeMap;
use dagwork::config::{ConfigSection, FlowFile, RawFlowFile, TaskConfig};
use dagwork::types::PanicPolicy;

/// Builder for `FlowFile` to simplify test setup.
pub struct FlowFileBuilder {
    config: RawFlowFile,
}

impl FlowFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawFlowFile {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn on_task_panic(mut self, policy: PanicPolicy) -> Self {
        self.config.config.on_task_panic = policy;
        self
    }

    pub fn deadline(mut self, deadline: &str) -> Self {
        self.config.config.deadline = Some(deadline.to_string());
        self
    }

    pub fn build_raw(self) -> RawFlowFile {
        self.config
    }

    pub fn build(self) -> FlowFile {
        FlowFile::try_from(self.config).expect("Failed to build valid flow from builder")
    }
}

impl Default for FlowFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                cmd: cmd.to_string(),
                after: vec![],
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

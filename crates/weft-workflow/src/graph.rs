//! Static task graphs: declared once, validated at construction, reusable
//! across runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weft_core::{WeftError, WeftResult};

/// One task declaration: a unique name plus the names of the tasks whose
/// outputs it consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDecl {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
}

/// Ordered task declarations. Declaration order is significant: it breaks
/// ties in scheduling and fixes the order of multi-parent inputs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    tasks: Vec<TaskDecl>,
}

impl GraphSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a task. Builder-style so specs read like the graph.
    pub fn task(mut self, name: impl Into<String>, parents: &[&str]) -> Self {
        self.tasks.push(TaskDecl {
            name: name.into(),
            parents: parents.iter().map(ToString::to_string).collect(),
        });
        self
    }

    pub fn tasks(&self) -> &[TaskDecl] {
        &self.tasks
    }
}

/// A validated graph with a frozen execution order.
#[derive(Debug)]
pub struct TaskGraph {
    tasks: Vec<TaskDecl>,
    topo: Vec<usize>,
    terminals: Vec<String>,
}

impl TaskGraph {
    /// Validates the spec and freezes a deterministic topological order.
    ///
    /// Duplicate names, unknown parent references, and cycles are all
    /// configuration errors caught here, before anything runs.
    pub fn new(spec: GraphSpec) -> WeftResult<Self> {
        let tasks = spec.tasks;
        if tasks.is_empty() {
            return Err(WeftError::Config("workflow graph has no tasks".into()));
        }

        let mut index_of: HashMap<&str, usize> = HashMap::new();
        for (idx, task) in tasks.iter().enumerate() {
            if index_of.insert(&task.name, idx).is_some() {
                return Err(WeftError::Config(format!(
                    "duplicate task name '{}'",
                    task.name
                )));
            }
        }
        for task in &tasks {
            for parent in &task.parents {
                if !index_of.contains_key(parent.as_str()) {
                    return Err(WeftError::Config(format!(
                        "task '{}' references unknown parent '{parent}'",
                        task.name
                    )));
                }
                if parent == &task.name {
                    return Err(WeftError::Config(format!(
                        "task '{}' depends on itself",
                        task.name
                    )));
                }
            }
        }

        let mut visited: HashMap<usize, u8> = HashMap::new();
        for idx in 0..tasks.len() {
            if Self::dfs_cycle(&tasks, &index_of, idx, &mut visited) {
                return Err(WeftError::Config("workflow graph contains a cycle".into()));
            }
        }

        // Kahn's algorithm, always taking the lowest declaration index
        // among the ready tasks, so the order is stable.
        let mut indegree: Vec<usize> = tasks.iter().map(|t| t.parents.len()).collect();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
        for (idx, task) in tasks.iter().enumerate() {
            for parent in &task.parents {
                children[index_of[parent.as_str()]].push(idx);
            }
        }
        let mut topo = Vec::with_capacity(tasks.len());
        let mut placed = vec![false; tasks.len()];
        while topo.len() < tasks.len() {
            let Some(next) = (0..tasks.len()).find(|&i| !placed[i] && indegree[i] == 0) else {
                // Unreachable after the DFS check, but never loop forever.
                return Err(WeftError::Config("workflow graph contains a cycle".into()));
            };
            placed[next] = true;
            topo.push(next);
            for &child in &children[next] {
                indegree[child] -= 1;
            }
        }

        let terminals = tasks
            .iter()
            .filter(|t| !tasks.iter().any(|other| other.parents.contains(&t.name)))
            .map(|t| t.name.clone())
            .collect();

        Ok(Self {
            tasks,
            topo,
            terminals,
        })
    }

    fn dfs_cycle(
        tasks: &[TaskDecl],
        index_of: &HashMap<&str, usize>,
        idx: usize,
        visited: &mut HashMap<usize, u8>,
    ) -> bool {
        match visited.get(&idx) {
            Some(1) => return true,  // back edge
            Some(2) => return false, // already processed
            _ => {}
        }
        visited.insert(idx, 1);
        for parent in &tasks[idx].parents {
            if Self::dfs_cycle(tasks, index_of, index_of[parent.as_str()], visited) {
                return true;
            }
        }
        visited.insert(idx, 2);
        false
    }

    /// Tasks in execution order.
    pub fn execution_order(&self) -> impl Iterator<Item = &TaskDecl> {
        self.topo.iter().map(|&idx| &self.tasks[idx])
    }

    /// Tasks that no other task consumes, in declaration order. Their
    /// outputs are the workflow result.
    pub fn terminals(&self) -> &[String] {
        &self.terminals
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

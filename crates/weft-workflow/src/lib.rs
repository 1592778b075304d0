//! Static DAG workflows over agent tasks: a graph of named tasks is
//! validated up front, then executed in a frozen topological order with
//! each task fed from its parents' outputs.

pub mod graph;
pub mod workflow;

pub use graph::{GraphSpec, TaskDecl, TaskGraph};
pub use workflow::{AgentBuilder, AgentTask, TaskAgent, TaskInput, Workflow};

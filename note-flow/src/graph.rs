use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::{
    context::Context,
    error::{GraphError, Result},
    task::{NextAction, Task},
};

/// Upper bound on task invocations per execution, guarding against edge cycles
pub const DEFAULT_MAX_STEPS: usize = 64;

/// Type alias for edge condition functions
pub type EdgeCondition = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Edge between tasks in the graph
#[derive(Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub condition: Option<EdgeCondition>,
}

/// An immutable graph of tasks.
///
/// A built graph holds no per-run state, so one instance can be shared behind
/// an `Arc` and executed concurrently with independent contexts.
pub struct Graph {
    pub id: String,
    tasks: HashMap<String, Arc<dyn Task>>,
    edges: Vec<Edge>,
    start_task_id: Option<String>,
    max_steps: usize,
}

impl Graph {
    /// Run from the start task until a task ends the execution or no edge matches
    pub async fn execute(&self, context: Context) -> Result<ExecutionResult> {
        let start = self.start_task_id.clone().ok_or(GraphError::NoStartTask)?;
        self.execute_from(&start, context).await
    }

    /// Run starting from a specific task
    pub async fn execute_from(&self, task_id: &str, context: Context) -> Result<ExecutionResult> {
        let mut current = task_id.to_string();
        let mut path = Vec::new();

        loop {
            if path.len() >= self.max_steps {
                return Err(GraphError::StepLimitExceeded(self.max_steps));
            }

            let task = self
                .tasks
                .get(&current)
                .ok_or_else(|| GraphError::TaskNotFound(current.clone()))?;

            debug!(graph_id = %self.id, task_id = %current, "running task");
            let mut result = task.run(context.clone()).await?;
            result.task_id = current.clone();
            path.push(current.clone());

            let next = match &result.next_action {
                NextAction::ContinueAndExecute => self.find_next_task(&current, &context),
                NextAction::GoTo(target) => {
                    if !self.tasks.contains_key(target) {
                        return Err(GraphError::TaskNotFound(target.clone()));
                    }
                    Some(target.clone())
                }
                NextAction::End => None,
            };

            match next {
                Some(next_task_id) => current = next_task_id,
                None => {
                    debug!(graph_id = %self.id, steps = path.len(), "graph execution finished");
                    return Ok(ExecutionResult {
                        response: result.response,
                        path,
                    });
                }
            }
        }
    }

    /// Find the next task based on edges and conditions.
    /// Edges are checked in insertion order; an unconditional edge always matches.
    pub fn find_next_task(&self, current_task_id: &str, context: &Context) -> Option<String> {
        self.edges
            .iter()
            .filter(|edge| edge.from == current_task_id)
            .find(|edge| edge.condition.as_ref().is_none_or(|condition| condition(context)))
            .map(|edge| edge.to.clone())
    }
}

/// Builder for creating graphs
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: Graph {
                id: id.into(),
                tasks: HashMap::new(),
                edges: Vec::new(),
                start_task_id: None,
                max_steps: DEFAULT_MAX_STEPS,
            },
        }
    }

    /// Add a task; the first task added becomes the start task
    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        let task_id = task.id().to_string();
        if self.graph.start_task_id.is_none() {
            self.graph.start_task_id = Some(task_id.clone());
        }
        self.graph.tasks.insert(task_id, task);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.graph.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: None,
        });
        self
    }

    pub fn add_conditional_edge<F>(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        condition: F,
    ) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.graph.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: Some(Arc::new(condition)),
        });
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.graph.max_steps = max_steps;
        self
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

/// Outcome of a completed graph execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Response of the last task that ran
    pub response: Option<String>,
    /// IDs of the tasks that ran, in order
    pub path: Vec<String>,
}

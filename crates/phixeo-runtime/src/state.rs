//! The executor: a fixed worker pool running a forest against one shared
//! environment.
//!
//! Roots go into a ready queue ordered by their distance from node 0 on the
//! spiral. Each worker takes a root and runs its whole subtree: a block
//! header evaluates first, then its body runs in child order on the same
//! worker. Unrelated roots therefore run concurrently while every body keeps
//! its fixed order.
//!
//! Node states move `Pending -> Ready -> Running -> (Done | Failed)`. A body
//! node becomes `Ready` once its header's own evaluation has succeeded;
//! nodes under a false condition or a failed header stay `Pending`. Loop
//! bodies pass through the cycle once per iteration and keep the state of
//! the last one.

use std::thread;

use crossbeam::channel;
use indexmap::IndexMap;
use parking_lot::Mutex;
use phixeo_core::{Forest, Node, NodeId};

use crate::env::Environment;
use crate::error::{EvalError, NodeError, RunError};
use crate::eval::{eval_expr, exec_stmt};
use crate::expr::{Expr, Stmt};
use crate::plan::{compile, LoopHeader, Plan};
use crate::trace::TraceEntry;
use crate::value::Value;

/// Worker count used when none is configured.
pub const DEFAULT_WORKERS: usize = 4;

/// Configuration for the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Size of the worker pool. Must be at least 1.
    pub workers: usize,
    /// Whether to record execution traces.
    pub trace_enabled: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            workers: DEFAULT_WORKERS,
            trace_enabled: false,
        }
    }
}

/// Execution state of one node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    /// Not reached (yet).
    Pending,
    /// Its header finished; it may run.
    Ready,
    Running,
    /// Its own evaluation and its whole body completed.
    Done,
    /// Its own evaluation failed. The body did not run.
    Failed(NodeError),
}

impl NodeState {
    /// Returns `true` for `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeState::Done | NodeState::Failed(_))
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Output lines in the order they were appended.
    pub output: Vec<String>,
    /// Final state of every node, indexed by node id.
    pub states: Vec<NodeState>,
    /// Final variable bindings.
    pub bindings: IndexMap<String, Value>,
    /// Evaluation steps, when tracing was enabled.
    pub trace: Option<Vec<TraceEntry>>,
}

impl RunReport {
    /// The output buffer joined with newlines.
    pub fn output_text(&self) -> String {
        self.output.join("\n")
    }

    pub fn state(&self, id: NodeId) -> Option<&NodeState> {
        self.states.get(id.index())
    }

    /// Nodes that ended in `Failed`, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (NodeId, &NodeError)> + '_ {
        self.states
            .iter()
            .enumerate()
            .filter_map(|(i, state)| match state {
                NodeState::Failed(err) => Some((NodeId(i as u32), err)),
                _ => None,
            })
    }
}

/// Mutable state shared by the workers of one run.
struct RunState {
    env: Mutex<Environment>,
    states: Mutex<Vec<NodeState>>,
    trace: Option<Mutex<Vec<TraceEntry>>>,
}

impl RunState {
    fn new(env: Environment, nodes: usize, trace_enabled: bool) -> Self {
        RunState {
            env: Mutex::new(env),
            states: Mutex::new(vec![NodeState::Pending; nodes]),
            trace: trace_enabled.then(|| Mutex::new(Vec::new())),
        }
    }

    fn set_state(&self, id: NodeId, state: NodeState) {
        if let Some(slot) = self.states.lock().get_mut(id.index()) {
            *slot = state;
        }
    }

    fn record(&self, worker: usize, node: &Node, value: Option<Value>, error: Option<NodeError>) {
        if let Some(trace) = &self.trace {
            trace.lock().push(TraceEntry {
                node_id: node.id,
                kind: node.kind,
                worker,
                value,
                error,
            });
        }
    }

    /// Runs `step` under the environment lock. A failure is written to the
    /// output before the lock is released.
    fn locked<T>(
        &self,
        step: impl FnOnce(&mut Environment) -> Result<T, NodeError>,
    ) -> Result<T, NodeError> {
        let mut env = self.env.lock();
        step(&mut env).inspect_err(|err| env.emit(format!("Error: {err}")))
    }

    fn into_report(self) -> RunReport {
        let (bindings, output) = self.env.into_inner().into_parts();
        RunReport {
            output,
            states: self.states.into_inner(),
            bindings,
            trace: self.trace.map(Mutex::into_inner),
        }
    }
}

/// Runs a validated forest.
///
/// Node text is compiled once in [`Executor::new`]; the executor can then be
/// run any number of times, each run starting from a fresh (or supplied)
/// environment.
#[derive(Debug)]
pub struct Executor<'f> {
    forest: &'f Forest,
    plans: Vec<Plan>,
    config: RuntimeConfig,
}

impl<'f> Executor<'f> {
    /// Validates `forest` and compiles every node.
    ///
    /// # Errors
    ///
    /// [`RunError::InvalidConfig`] for a zero-sized pool and
    /// [`RunError::Structural`] when [`Forest::validate`] fails. No node runs
    /// in either case.
    pub fn new(forest: &'f Forest, config: RuntimeConfig) -> Result<Self, RunError> {
        if config.workers == 0 {
            return Err(RunError::InvalidConfig {
                reason: "the worker pool needs at least one worker".into(),
            });
        }
        forest.validate()?;
        let plans = forest.nodes().iter().map(compile).collect();
        Ok(Executor {
            forest,
            plans,
            config,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Runs the forest in an empty environment.
    pub fn run(&self) -> Result<RunReport, RunError> {
        self.run_in(Environment::new())
    }

    /// Runs the forest with `env` as the starting environment.
    ///
    /// # Errors
    ///
    /// [`RunError::WorkerPanicked`] if a worker thread panicked. Per-node
    /// failures are not errors; they show up in the output and in
    /// [`RunReport::states`].
    pub fn run_in(&self, env: Environment) -> Result<RunReport, RunError> {
        let run = RunState::new(env, self.forest.len(), self.config.trace_enabled);
        let order = self.root_order();
        let pool = self.config.workers.min(order.len()).max(1);

        tracing::info!(roots = order.len(), workers = pool, "run started");

        let (tx, rx) = channel::unbounded();
        for &id in &order {
            run.set_state(id, NodeState::Ready);
            // The receiver is alive until the pool below is done.
            let _ = tx.send(id);
        }
        drop(tx);

        let panicked = thread::scope(|scope| {
            let handles: Vec<_> = (0..pool)
                .map(|worker| {
                    let rx = rx.clone();
                    let run = &run;
                    scope.spawn(move || {
                        while let Ok(id) = rx.recv() {
                            self.run_node(run, worker, id);
                        }
                    })
                })
                .collect();

            let mut panicked = None;
            for (worker, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() && panicked.is_none() {
                    panicked = Some(worker);
                }
            }
            panicked
        });
        if let Some(worker) = panicked {
            return Err(RunError::WorkerPanicked { worker });
        }

        let report = run.into_report();
        tracing::info!(
            lines = report.output.len(),
            failed = report.failures().count(),
            "run finished"
        );
        Ok(report)
    }

    /// Roots by ascending distance from node 0. Ties keep program order.
    fn root_order(&self) -> Vec<NodeId> {
        let origin = self
            .forest
            .nodes()
            .first()
            .map(|n| n.position)
            .unwrap_or_default();
        let mut roots: Vec<(f64, NodeId)> = self
            .forest
            .roots()
            .iter()
            .filter_map(|&id| {
                self.forest
                    .node(id)
                    .map(|n| (n.position.distance(origin), id))
            })
            .collect();
        roots.sort_by(|a, b| a.0.total_cmp(&b.0));
        roots.into_iter().map(|(_, id)| id).collect()
    }

    fn run_node(&self, run: &RunState, worker: usize, id: NodeId) {
        let (Some(node), Some(plan)) = (self.forest.node(id), self.plans.get(id.index())) else {
            return;
        };
        run.set_state(id, NodeState::Running);
        tracing::debug!(node = %id, kind = ?node.kind, worker, "evaluating node");

        let result = match plan {
            Plan::Statement(stmt) => self.run_statement(run, worker, node, stmt),
            Plan::Loop(header) => self.run_loop(run, worker, node, header),
            Plan::Conditional(condition) => self.run_conditional(run, worker, node, condition),
            Plan::Function => {
                run.env.lock().emit(node.text.clone());
                run.record(worker, node, None, None);
                self.run_body(run, worker, node);
                Ok(())
            }
            Plan::Aggregate => {
                run.record(worker, node, None, None);
                for &sub in &node.subnodes {
                    run.set_state(sub, NodeState::Ready);
                    self.run_node(run, worker, sub);
                }
                Ok(())
            }
        };

        let state = match result {
            Ok(()) => NodeState::Done,
            Err(err) => {
                tracing::warn!(node = %id, kind = ?node.kind, error = %err, "node failed");
                run.record(worker, node, None, Some(err.clone()));
                NodeState::Failed(err)
            }
        };
        run.set_state(id, state);
    }

    fn run_body(&self, run: &RunState, worker: usize, node: &Node) {
        for &child in &node.children {
            run.set_state(child, NodeState::Ready);
            self.run_node(run, worker, child);
        }
    }

    fn run_statement(
        &self,
        run: &RunState,
        worker: usize,
        node: &Node,
        stmt: &Result<Stmt, EvalError>,
    ) -> Result<(), NodeError> {
        run.locked(|env| {
            let stmt = stmt.as_ref().map_err(|err| NodeError::from(err.clone()))?;
            Ok(exec_stmt(stmt, env)?)
        })?;
        run.record(worker, node, None, None);
        Ok(())
    }

    /// Evaluates the iterable once, then binds, records and runs the body for
    /// each value in turn.
    fn run_loop(
        &self,
        run: &RunState,
        worker: usize,
        node: &Node,
        header: &Result<LoopHeader, NodeError>,
    ) -> Result<(), NodeError> {
        let header = match header {
            Ok(header) => header,
            Err(err) => return run.locked(|_| Err(err.clone())),
        };
        let values = run.locked(|env| Ok(eval_expr(&header.iterable, env)?.into_values()?))?;

        for value in values {
            {
                let mut env = run.env.lock();
                env.bind(header.var.clone(), value.clone());
                env.emit(format!("{}  # {}", node.text, value));
            }
            run.record(worker, node, Some(value), None);
            self.run_body(run, worker, node);
        }
        Ok(())
    }

    fn run_conditional(
        &self,
        run: &RunState,
        worker: usize,
        node: &Node,
        condition: &Result<Expr, NodeError>,
    ) -> Result<(), NodeError> {
        let condition = match condition {
            Ok(condition) => condition,
            Err(err) => return run.locked(|_| Err(err.clone())),
        };
        let value = run.locked(|env| {
            let value = eval_expr(condition, env)?;
            if value.is_truthy() {
                env.emit(node.text.clone());
            }
            Ok(value)
        })?;
        let taken = value.is_truthy();
        run.record(worker, node, Some(value), None);
        if taken {
            self.run_body(run, worker, node);
        }
        Ok(())
    }
}

/// Validates, compiles and runs `forest` in one call.
pub fn execute(forest: &Forest, config: RuntimeConfig) -> Result<RunReport, RunError> {
    Executor::new(forest, config)?.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use phixeo_core::build;

    fn run_with(source: &str, workers: usize) -> RunReport {
        let forest = build(source);
        let config = RuntimeConfig {
            workers,
            ..RuntimeConfig::default()
        };
        execute(&forest, config).unwrap()
    }

    #[test]
    fn default_config_uses_four_workers() {
        let config = RuntimeConfig::default();
        assert_eq!(config.workers, 4);
        assert!(!config.trace_enabled);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let forest = build("x = 1");
        let err = Executor::new(&forest, RuntimeConfig { workers: 0, trace_enabled: false })
            .unwrap_err();
        assert!(matches!(err, RunError::InvalidConfig { .. }));
    }

    #[test]
    fn loop_records_precede_their_body() {
        let report = run_with("for i in range(2):\n    print(i * 10)", 1);
        assert_eq!(
            report.output,
            vec![
                "for i in range(2):  # 0",
                "0",
                "for i in range(2):  # 1",
                "10"
            ]
        );
        assert_eq!(report.bindings.get("i"), Some(&Value::Int(1)));
    }

    #[test]
    fn false_condition_skips_body_without_error() {
        let report = run_with("x = 1\nif x > 5:\n    print('big')", 1);
        assert!(report.output.is_empty());
        assert_eq!(report.state(NodeId(1)), Some(&NodeState::Done));
        assert_eq!(report.state(NodeId(2)), Some(&NodeState::Pending));
    }

    #[test]
    fn true_condition_emits_header_then_body() {
        let report = run_with("x = 9\nif x > 5:\n    print('big')", 1);
        assert_eq!(report.output, vec!["if x > 5:", "big"]);
    }

    #[test]
    fn function_body_runs_eagerly() {
        let report = run_with("def greet():\n    print('hi')", 2);
        assert_eq!(report.output, vec!["def greet():", "hi"]);
    }

    #[test]
    fn statement_failure_is_contained() {
        let report = run_with("def main():\n    print(missing)\n    print('after')", 1);
        assert_eq!(
            report.output,
            vec!["def main():", "Error: name 'missing' is not defined", "after"]
        );
        assert!(matches!(report.state(NodeId(1)), Some(NodeState::Failed(_))));
        assert_eq!(report.state(NodeId(0)), Some(&NodeState::Done));
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn non_iterable_loop_fails_without_running_body() {
        let report = run_with("for i in 5:\n    print(i)", 1);
        assert_eq!(report.output, vec!["Error: 'int' object is not iterable"]);
        assert_eq!(report.state(NodeId(1)), Some(&NodeState::Pending));
    }

    #[test]
    fn trace_records_each_iteration() {
        let forest = build("for i in range(3):\n    x = i");
        let config = RuntimeConfig {
            workers: 1,
            trace_enabled: true,
        };
        let report = execute(&forest, config).unwrap();
        let trace = report.trace.unwrap();
        let loop_values: Vec<_> = trace
            .iter()
            .filter(|e| e.node_id == NodeId(0))
            .filter_map(|e| e.value.clone())
            .collect();
        assert_eq!(loop_values, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
        assert_eq!(trace.len(), 6);
    }

    #[test]
    fn executor_can_run_twice() {
        let forest = build("x = 2\nprint(x)");
        let executor = Executor::new(&forest, RuntimeConfig::default()).unwrap();
        let first = executor.run().unwrap();
        let second = executor.run().unwrap();
        assert_eq!(first.output, second.output);
    }
}

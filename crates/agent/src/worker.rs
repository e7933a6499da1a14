//! Uniform worker contract and the kind-keyed registry.
//!
//! Every pipeline worker implements the same lifecycle: idempotent
//! `initialize`, a `perform` body, and metrics. The provided `execute`
//! wrapper is the only way work crosses the boundary: it times the call and
//! converts any failure into a structured `AgentResult`, so no error ever
//! propagates out of a worker by unwinding.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use charterly_core::domain::task::{
    AgentResult, AgentTask, ResultMetadata, TaskStatus, WorkerKind,
};
use charterly_core::domain::trip::ThreadId;

#[derive(Clone, Debug, Default)]
pub struct WorkerContext {
    pub request_id: String,
    pub thread_id: Option<ThreadId>,
    pub payload: serde_json::Value,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl WorkerContext {
    pub fn for_task(task: &AgentTask) -> Self {
        Self {
            request_id: task.id.0.clone(),
            thread_id: None,
            payload: task.payload.clone(),
            metadata: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerMetrics {
    pub executions: u64,
    pub successes: u64,
    pub failures: u64,
    pub avg_latency_ms: f64,
    pub tool_calls: u64,
}

/// Instance-owned metrics holder shared by all workers. Plain mutex; worker
/// calls are request/response with no internal fan-out.
#[derive(Debug, Default)]
pub struct MetricsCell {
    inner: Mutex<WorkerMetrics>,
}

impl MetricsCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> WorkerMetrics {
        *self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    pub fn record(&self, success: bool, elapsed_ms: u64, tool_calls: u32) {
        let mut metrics = self.inner.lock().unwrap_or_else(|poison| poison.into_inner());
        let previous_total = metrics.avg_latency_ms * metrics.executions as f64;
        metrics.executions += 1;
        if success {
            metrics.successes += 1;
        } else {
            metrics.failures += 1;
        }
        metrics.avg_latency_ms = (previous_total + elapsed_ms as f64) / metrics.executions as f64;
        metrics.tool_calls += u64::from(tool_calls);
    }
}

/// What a worker body hands back: a payload plus how many collaborator
/// calls it made along the way.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkerOutput {
    pub data: serde_json::Value,
    pub tool_calls: u32,
}

impl WorkerOutput {
    pub fn new(data: serde_json::Value, tool_calls: u32) -> Self {
        Self { data, tool_calls }
    }
}

impl From<serde_json::Value> for WorkerOutput {
    fn from(data: serde_json::Value) -> Self {
        Self { data, tool_calls: 0 }
    }
}

#[async_trait]
pub trait Worker: Send + Sync {
    fn kind(&self) -> WorkerKind;

    fn metrics_cell(&self) -> &MetricsCell;

    /// Idempotent setup. The default is a no-op; workers with collaborators
    /// override it to warm them up.
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// The worker body. May fail freely; `execute` converts failures.
    async fn perform(&self, context: &WorkerContext) -> Result<WorkerOutput>;

    fn metrics(&self) -> WorkerMetrics {
        self.metrics_cell().snapshot()
    }

    /// The only entry point callers use. Never panics through, never throws:
    /// a failed body becomes `AgentResult { success: false, .. }` with the
    /// execution time attached either way.
    async fn execute(&self, context: &WorkerContext) -> AgentResult {
        let started = Instant::now();
        let outcome = self.perform(context).await;
        let execution_time_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                self.metrics_cell().record(true, execution_time_ms, output.tool_calls);
                AgentResult::ok(
                    output.data,
                    ResultMetadata { execution_time_ms, tool_calls: output.tool_calls },
                )
            }
            Err(error) => {
                self.metrics_cell().record(false, execution_time_ms, 0);
                warn!(
                    event_name = "worker.execution_failed",
                    worker = self.kind().as_str(),
                    request_id = %context.request_id,
                    error = %error,
                    "worker execution failed"
                );
                AgentResult::failed(
                    format!("{error:#}"),
                    ResultMetadata { execution_time_ms, tool_calls: 0 },
                )
            }
        }
    }
}

/// WorkerKind-keyed registry. Dispatch goes through the type tag so new
/// worker kinds slot in without touching orchestrator control flow.
#[derive(Default)]
pub struct WorkerRegistry {
    workers: HashMap<WorkerKind, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, worker: Arc<dyn Worker>) {
        self.workers.insert(worker.kind(), worker);
    }

    pub fn get(&self, kind: WorkerKind) -> Option<Arc<dyn Worker>> {
        self.workers.get(&kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Executes a task against its target worker, tracking task status
    /// through in_flight to done/failed. An unregistered target is a
    /// structured failure, not a panic.
    pub async fn dispatch(&self, task: &mut AgentTask) -> AgentResult {
        let Some(worker) = self.get(task.target) else {
            task.status = TaskStatus::Failed;
            return AgentResult::failed(
                format!("no worker registered for kind `{}`", task.target.as_str()),
                ResultMetadata::default(),
            );
        };

        task.status = TaskStatus::InFlight;
        let context = WorkerContext::for_task(task);
        let result = worker.execute(&context).await;
        task.status = if result.success { TaskStatus::Done } else { TaskStatus::Failed };
        result
    }
}

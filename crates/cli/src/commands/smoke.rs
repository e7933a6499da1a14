use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::json;

use charterly_agent::classify::KeywordIntentClassifier;
use charterly_agent::orchestrator::TaskOrchestrator;
use charterly_agent::worker::WorkerRegistry;
use charterly_agent::workers::{
    CommunicationWorker, FlightSearchWorker, ProposalAnalysisWorker, RecordingDelivery,
    StaticMarketplace,
};
use charterly_core::config::{AppConfig, LoadOptions};
use charterly_core::domain::task::WorkerKind;
use charterly_core::domain::trip::{ThreadId, UserId};
use charterly_db::{connect_with_settings, migrations, InMemoryConversationStore};

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(LoadOptions::default())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.push(skipped("db_connectivity"));
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("conversation_flow"));
            checks.push(skipped("worker_pipeline"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            checks.push(skipped("migration_visibility"));
            checks.push(skipped("conversation_flow"));
            checks.push(skipped("worker_pipeline"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let db_started = Instant::now();
    let db_result = runtime.block_on(async {
        connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
    });

    match db_result {
        Ok(pool) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Pass,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("connected using `{}`", config.database.url),
            });

            let migration_started = Instant::now();
            let migration_result = runtime.block_on(async { migrations::run_pending(&pool).await });
            runtime.block_on(async {
                pool.close().await;
            });

            match migration_result {
                Ok(()) => checks.push(SmokeCheck {
                    name: "migration_visibility",
                    status: SmokeStatus::Pass,
                    elapsed_ms: migration_started.elapsed().as_millis() as u64,
                    message: "migrations are visible and executable".to_string(),
                }),
                Err(error) => checks.push(SmokeCheck {
                    name: "migration_visibility",
                    status: SmokeStatus::Fail,
                    elapsed_ms: migration_started.elapsed().as_millis() as u64,
                    message: format!("migration execution failed: {error}"),
                }),
            }
        }
        Err(error) => {
            checks.push(SmokeCheck {
                name: "db_connectivity",
                status: SmokeStatus::Fail,
                elapsed_ms: db_started.elapsed().as_millis() as u64,
                message: format!("failed to connect: {error}"),
            });
            checks.push(skipped("migration_visibility"));
        }
    }

    let (flow_check, pipeline_check) =
        runtime.block_on(async { conversation_and_pipeline(&config).await });
    checks.push(flow_check);
    checks.push(pipeline_check);

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

/// Drives a scripted conversation through the orchestrator against the
/// in-memory store, then executes the emitted tasks through the worker
/// registry: search, analyze, deliver.
async fn conversation_and_pipeline(config: &AppConfig) -> (SmokeCheck, SmokeCheck) {
    let flow_started = Instant::now();

    let store = Arc::new(InMemoryConversationStore::new());
    let orchestrator = TaskOrchestrator::new(
        store,
        Arc::new(KeywordIntentClassifier::new()),
        config.intent.confidence_floor,
        config.conversation.max_clarification_rounds,
    );

    let thread = ThreadId("smoke-thread".to_string());
    let user = UserId("smoke-user".to_string());
    let script = [
        "JFK to LAX",
        "tomorrow, returning in 5 days",
        "4 passengers",
        "no preference",
    ];

    let mut final_reply = None;
    for turn in script {
        match orchestrator.handle_message(&thread, &user, turn).await {
            Ok(reply) => final_reply = Some(reply),
            Err(error) => {
                let flow = SmokeCheck {
                    name: "conversation_flow",
                    status: SmokeStatus::Fail,
                    elapsed_ms: flow_started.elapsed().as_millis() as u64,
                    message: format!("turn `{turn}` failed: {error}"),
                };
                return (flow, skipped("worker_pipeline"));
            }
        }
    }

    let reply = match final_reply {
        Some(reply) if reply.complete && !reply.tasks.is_empty() => reply,
        Some(reply) => {
            let flow = SmokeCheck {
                name: "conversation_flow",
                status: SmokeStatus::Fail,
                elapsed_ms: flow_started.elapsed().as_millis() as u64,
                message: format!(
                    "conversation ended on step `{}` without tasks: {}",
                    reply.step.as_str(),
                    reply.message
                ),
            };
            return (flow, skipped("worker_pipeline"));
        }
        None => {
            let flow = SmokeCheck {
                name: "conversation_flow",
                status: SmokeStatus::Fail,
                elapsed_ms: flow_started.elapsed().as_millis() as u64,
                message: "no reply produced".to_string(),
            };
            return (flow, skipped("worker_pipeline"));
        }
    };

    let flow = SmokeCheck {
        name: "conversation_flow",
        status: SmokeStatus::Pass,
        elapsed_ms: flow_started.elapsed().as_millis() as u64,
        message: format!("request completed with {} task(s)", reply.tasks.len()),
    };

    let pipeline_started = Instant::now();
    let mut registry = WorkerRegistry::new();
    registry.register(Arc::new(FlightSearchWorker::new(Arc::new(StaticMarketplace::new()))));
    registry.register(Arc::new(ProposalAnalysisWorker::new()));
    registry.register(Arc::new(CommunicationWorker::new(Arc::new(RecordingDelivery::new()))));

    let mut tasks = reply.tasks;
    let Some(search_task) = tasks.iter_mut().find(|task| task.kind == WorkerKind::FlightSearch)
    else {
        let pipeline = SmokeCheck {
            name: "worker_pipeline",
            status: SmokeStatus::Fail,
            elapsed_ms: pipeline_started.elapsed().as_millis() as u64,
            message: "no flight_search task was emitted".to_string(),
        };
        return (flow, pipeline);
    };

    let search_result = registry.dispatch(search_task).await;
    if !search_result.success {
        let pipeline = SmokeCheck {
            name: "worker_pipeline",
            status: SmokeStatus::Fail,
            elapsed_ms: pipeline_started.elapsed().as_millis() as u64,
            message: format!(
                "flight search failed: {}",
                search_result.error.unwrap_or_default()
            ),
        };
        return (flow, pipeline);
    }

    let search_data = search_result.data.unwrap_or_default();
    let request = search_task.payload.get("request").cloned().unwrap_or_default();
    let mut analysis_task = charterly_core::domain::task::AgentTask::new(
        WorkerKind::ProposalAnalysis,
        json!({"request": request, "options": search_data.get("options")}),
        search_task.priority,
        search_task.created_at,
    );
    let analysis_result = registry.dispatch(&mut analysis_task).await;

    let mut delivery_task = charterly_core::domain::task::AgentTask::new(
        WorkerKind::Communication,
        json!({
            "recipient": "smoke@example.com",
            "summary": "Smoke run proposal",
        }),
        search_task.priority,
        search_task.created_at,
    );
    let delivery_result = registry.dispatch(&mut delivery_task).await;

    let pipeline = if analysis_result.success && delivery_result.success {
        SmokeCheck {
            name: "worker_pipeline",
            status: SmokeStatus::Pass,
            elapsed_ms: pipeline_started.elapsed().as_millis() as u64,
            message: "search, analysis and delivery all succeeded".to_string(),
        }
    } else {
        SmokeCheck {
            name: "worker_pipeline",
            status: SmokeStatus::Fail,
            elapsed_ms: pipeline_started.elapsed().as_millis() as u64,
            message: format!(
                "analysis success={}, delivery success={}",
                analysis_result.success, delivery_result.success
            ),
        }
    };

    (flow, pipeline)
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((started.elapsed().as_millis() as u64, value)),
        Err(error) => Err((started.elapsed().as_millis() as u64, error)),
    }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due to a previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}

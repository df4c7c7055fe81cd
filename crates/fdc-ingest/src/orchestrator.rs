//! Dataset run orchestration
//!
//! A run moves through
//! `Init -> LoadingDictionaries -> LoadingPrimary -> MergingChildren -> Done`,
//! or to `Failed` from any stage. Dictionaries and the primary file are loaded
//! in sequence, followed by the plan's stages one at a time; then every child
//! loader is spawned as its own task and the orchestrator waits for all of
//! them. A failing task never cancels its siblings, and nothing already
//! written is rolled back.

use std::sync::Arc;

use async_trait::async_trait;
use fdc_common::types::DocType;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::JoinError;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::IngestConfig;
use crate::context::IngestContext;
use crate::counts::CountsSnapshot;
use crate::datasets::DatasetPlan;
use crate::dictionary::DictionaryCache;
use crate::error::{IngestError, Result};
use crate::store::DocumentStore;

/// A loader launched concurrently after the primary load
#[async_trait]
pub trait ChildLoader: Send + Sync {
    fn name(&self) -> &str;

    /// Consume the whole file; returns rows consumed
    async fn run(&self, ctx: &IngestContext) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Init,
    LoadingDictionaries,
    LoadingPrimary,
    MergingChildren,
    Done,
    Failed,
}

/// How one child task ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    pub task: String,
    /// Rows consumed; unknown when the task failed
    pub rows: Option<u64>,
    /// First error the task reported
    pub error: Option<String>,
    #[serde(skip)]
    pub fatal: bool,
}

impl TaskOutcome {
    fn succeeded(task: String, rows: u64) -> Self {
        Self {
            task,
            rows: Some(rows),
            error: None,
            fatal: false,
        }
    }

    fn failed(task: String, error: &IngestError) -> Self {
        Self {
            task,
            rows: None,
            error: Some(error.to_string()),
            fatal: error.is_fatal(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub dataset: DocType,
    pub state: RunState,
    pub counts: CountsSnapshot,
    pub tasks: Vec<TaskOutcome>,
}

impl RunReport {
    /// Every task succeeded and every consumed row reached the store
    pub fn fully_committed(&self) -> bool {
        self.tasks.iter().all(|t| t.error.is_none()) && !self.counts.has_losses()
    }

    /// False only when a task hit a fatal (file) error. Dropped batches and
    /// orphaned rows are partial commits, not failures.
    pub fn exit_ok(&self) -> bool {
        !self.tasks.iter().any(|t| t.fatal)
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.tasks.iter().filter(|t| t.error.is_some())
    }
}

pub struct IngestOrchestrator {
    store: Arc<dyn DocumentStore>,
    config: IngestConfig,
    state: RunState,
}

impl IngestOrchestrator {
    pub fn new(store: Arc<dyn DocumentStore>, config: IngestConfig) -> Self {
        Self {
            store,
            config,
            state: RunState::Init,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        info!(from = ?self.state, to = ?next, "Run state changed");
        self.state = next;
    }

    /// Run one dataset.
    ///
    /// Dictionary and primary failures abort the run and are returned as
    /// errors; children are never launched. Child failures end in
    /// `RunState::Failed` inside an `Ok` report.
    pub async fn run(&mut self, plan: DatasetPlan) -> Result<RunReport> {
        let DatasetPlan {
            doc_type,
            dictionaries,
            primary,
            stages,
            children,
        } = plan;
        self.config.validate()?;
        let mut ctx = IngestContext::new(self.store.clone(), doc_type, self.config.clone());

        info!(
            stages = stages.len(),
            children = children.len(),
            "Starting {} ingest", doc_type
        );

        if !dictionaries.is_empty() {
            self.transition(RunState::LoadingDictionaries);
            let loaded = DictionaryCache::load(
                self.store.as_ref(),
                &self.config.namespace,
                &dictionaries,
                self.config.dictionary_page_limit,
            )
            .await;
            match loaded {
                Ok(cache) => ctx = ctx.with_dictionaries(cache),
                Err(e) => return Err(self.abort(&ctx, e)),
            }
        }

        self.transition(RunState::LoadingPrimary);
        if let Err(e) = primary.run(&ctx).await {
            return Err(self.abort(&ctx, e));
        }

        self.transition(RunState::MergingChildren);
        let mut tasks = Self::run_stages(&ctx, stages).await;
        tasks.extend(Self::run_children(&ctx, children).await);
        tasks.sort_by(|a, b| a.task.cmp(&b.task));

        let failed = tasks.iter().any(|t| t.error.is_some());
        self.transition(if failed {
            RunState::Failed
        } else {
            RunState::Done
        });

        let report = RunReport {
            dataset: doc_type,
            state: self.state,
            counts: ctx.counts.snapshot(),
            tasks,
        };
        log_counts(&report.counts);
        if report.fully_committed() {
            info!("{} ingest fully committed", doc_type);
        } else {
            warn!(
                failed_tasks = report.failed_tasks().count(),
                "{} ingest partially committed", doc_type
            );
        }
        Ok(report)
    }

    fn abort(&mut self, ctx: &IngestContext, e: IngestError) -> IngestError {
        error!(stage = ?self.state, error = %e, "Run aborted");
        self.transition(RunState::Failed);
        log_counts(&ctx.counts.snapshot());
        e
    }

    /// Run loaders one at a time. A failed stage is recorded and the next one
    /// still runs.
    async fn run_stages(
        ctx: &IngestContext,
        stages: Vec<Arc<dyn ChildLoader>>,
    ) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(stages.len());
        for stage in stages {
            let name = stage.name().to_string();
            let ctx = ctx.clone();
            let joined = tokio::spawn(async move { stage.run(&ctx).await }).await;
            outcomes.push(settle(name, joined));
        }
        outcomes
    }

    async fn run_children(
        ctx: &IngestContext,
        children: Vec<Arc<dyn ChildLoader>>,
    ) -> Vec<TaskOutcome> {
        let mut pending: FuturesUnordered<_> = children
            .into_iter()
            .map(|task| {
                let name = task.name().to_string();
                let ctx = ctx.clone();
                let handle = tokio::spawn(async move { task.run(&ctx).await });
                async move { (name, handle.await) }
            })
            .collect();

        let mut outcomes = Vec::new();
        while let Some((name, joined)) = pending.next().await {
            outcomes.push(settle(name, joined));
        }
        outcomes
    }
}

fn settle(name: String, joined: std::result::Result<Result<u64>, JoinError>) -> TaskOutcome {
    match joined {
        Ok(Ok(rows)) => {
            info!(task = %name, rows, "Task finished");
            TaskOutcome::succeeded(name, rows)
        },
        Ok(Err(e)) => {
            error!(task = %name, error = %e, "Task failed");
            TaskOutcome::failed(name, &e)
        },
        Err(join) => {
            let e = IngestError::TaskPanicked {
                task: name.clone(),
                message: join.to_string(),
            };
            error!(task = %name, error = %e, "Task did not complete");
            TaskOutcome::failed(name, &e)
        },
    }
}

fn log_counts(counts: &CountsSnapshot) {
    info!(
        foods = counts.foods,
        servings = counts.servings,
        nutrients = counts.nutrients,
        other = counts.other,
        orphaned_rows = counts.orphaned_rows,
        dropped_facts = counts.dropped_facts,
        failed_batches = counts.failed_batches,
        "Final counts"
    );
}

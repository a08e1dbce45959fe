use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use uuid::Uuid;

use super::{BuildError, BuildReport};
use crate::knowledge::Graph;
use crate::plugins::{PluginManager, PopulateError, Populator};

type PanicPayload = Box<dyn Any + Send>;
type TaskOutput = (String, Result<Result<(), PopulateError>, PanicPayload>);

/// Runs every populator concurrently into one fresh graph, then infers edges.
///
/// The first populator to fail or panic cancels all of its siblings and the
/// build returns an error without running inference. Dropping the future
/// returned by [`build`](Self::build) cancels the populators as well.
pub struct GraphBuildOrchestrator {
    populators: Vec<Arc<dyn Populator>>,
    timeout: Option<Duration>,
}

impl GraphBuildOrchestrator {
    pub fn new(populators: Vec<Arc<dyn Populator>>) -> Self {
        Self {
            populators,
            timeout: None,
        }
    }

    pub fn from_plugins(plugins: &PluginManager) -> Self {
        Self::new(plugins.populators())
    }

    /// Fail the build when population takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn populator_names(&self) -> Vec<String> {
        self.populators.iter().map(|p| p.name().to_string()).collect()
    }

    /// Populate, join, infer. Nothing is written to disk.
    pub async fn build(&self) -> Result<(Arc<Graph>, BuildReport), BuildError> {
        let build_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let graph = Arc::new(Graph::new());

        tracing::info!(
            %build_id,
            populators = self.populators.len(),
            "Starting graph build"
        );

        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.populate(&graph)).await {
                Ok(result) => result?,
                Err(_) => {
                    tracing::error!(%build_id, timeout = ?limit, "Graph build timed out");
                    return Err(BuildError::Timeout(limit));
                }
            },
            None => self.populate(&graph).await?,
        }

        let inference = graph.infer_edges();
        let report = BuildReport {
            build_id,
            started_at,
            elapsed: start.elapsed(),
            populators: self.populator_names(),
            inference,
            stats: graph.stats(),
        };

        tracing::info!(
            %build_id,
            nodes = report.stats.nodes,
            edges = report.stats.edges,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Graph build finished"
        );
        Ok((graph, report))
    }

    /// One full cycle: build, then save to `snapshot_path`.
    ///
    /// A failed build leaves any existing snapshot untouched.
    pub async fn run_cycle(&self, snapshot_path: &Path) -> Result<BuildReport, BuildError> {
        let (graph, report) = self.build().await?;
        graph.save(snapshot_path).map_err(BuildError::Persist)?;
        Ok(report)
    }

    async fn populate(&self, graph: &Arc<Graph>) -> Result<(), BuildError> {
        let mut tasks: JoinSet<TaskOutput> = JoinSet::new();
        for populator in &self.populators {
            let populator = Arc::clone(populator);
            let graph = Arc::clone(graph);
            tasks.spawn(async move {
                let name = populator.name().to_string();
                tracing::info!(plugin = %name, "Populator started");
                let outcome = AssertUnwindSafe(populator.populate_graph(&graph))
                    .catch_unwind()
                    .await;
                (name, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok((name, Ok(Ok(())))) => {
                    tracing::info!(plugin = %name, "Populator finished");
                    continue;
                }
                Ok((_, Ok(Err(e)))) => BuildError::Populator(e),
                Ok((name, Err(payload))) => BuildError::PopulatorPanicked {
                    plugin: name,
                    message: panic_message(payload.as_ref()),
                },
                Err(e) if e.is_cancelled() => BuildError::Cancelled,
                Err(e) => BuildError::PopulatorPanicked {
                    plugin: "unknown".to_string(),
                    message: e.to_string(),
                },
            };

            tracing::error!(error = %failure, "Cancelling remaining populators");
            tasks.abort_all();
            // Wait for the aborted tasks so none outlive the failed build
            while tasks.join_next().await.is_some() {}
            return Err(failure);
        }

        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_variants() {
        let s: PanicPayload = Box::new("boom");
        assert_eq!(panic_message(s.as_ref()), "boom");

        let s: PanicPayload = Box::new(String::from("bang"));
        assert_eq!(panic_message(s.as_ref()), "bang");

        let s: PanicPayload = Box::new(42u8);
        assert_eq!(panic_message(s.as_ref()), "non-string panic payload");
    }

    #[tokio::test]
    async fn test_build_without_populators_is_empty() {
        let orchestrator = GraphBuildOrchestrator::new(Vec::new());
        let (graph, report) = orchestrator.build().await.unwrap();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(report.stats.nodes, 0);
        assert!(report.populators.is_empty());
    }
}

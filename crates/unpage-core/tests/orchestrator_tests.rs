use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use unpage_core::{
    BuildError, Graph, GraphBuildOrchestrator, Node, NodeKind, PopulateError, Populator,
};

/// Adds fixed nodes after an optional delay.
struct StaticPopulator {
    name: &'static str,
    nodes: Vec<Node>,
    delay: Duration,
}

#[async_trait]
impl Populator for StaticPopulator {
    fn name(&self) -> &str {
        self.name
    }

    async fn populate_graph(&self, graph: &Graph) -> Result<(), PopulateError> {
        tokio::time::sleep(self.delay).await;
        for node in &self.nodes {
            graph.add_node(node.clone());
        }
        Ok(())
    }
}

struct FailingPopulator;

#[async_trait]
impl Populator for FailingPopulator {
    fn name(&self) -> &str {
        "broken"
    }

    async fn populate_graph(&self, _graph: &Graph) -> Result<(), PopulateError> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Err(PopulateError::new("broken", "API quota exhausted"))
    }
}

struct PanickingPopulator;

#[async_trait]
impl Populator for PanickingPopulator {
    fn name(&self) -> &str {
        "panicky"
    }

    async fn populate_graph(&self, _graph: &Graph) -> Result<(), PopulateError> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        panic!("unexpected payload");
    }
}

/// Sleeps far longer than any test and records whether it finished or was dropped.
struct SlowPopulator {
    finished: Arc<AtomicBool>,
    dropped: Arc<AtomicBool>,
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Populator for SlowPopulator {
    fn name(&self) -> &str {
        "slow"
    }

    async fn populate_graph(&self, graph: &Graph) -> Result<(), PopulateError> {
        let _guard = DropFlag(self.dropped.clone());
        tokio::time::sleep(Duration::from_secs(60)).await;
        graph.add_node(Node::new("late", NodeKind::Resource, json!({})));
        self.finished.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn slow() -> (SlowPopulator, Arc<AtomicBool>, Arc<AtomicBool>) {
    let finished = Arc::new(AtomicBool::new(false));
    let dropped = Arc::new(AtomicBool::new(false));
    let populator = SlowPopulator {
        finished: finished.clone(),
        dropped: dropped.clone(),
    };
    (populator, finished, dropped)
}

fn vm_and_disk() -> (StaticPopulator, StaticPopulator) {
    let vms = StaticPopulator {
        name: "vms",
        nodes: vec![Node::new(
            "gcp:instance:vm-1",
            NodeKind::GcpComputeInstance,
            json!({"name": "vm-1"}),
        )],
        delay: Duration::from_millis(20),
    };
    let disks = StaticPopulator {
        name: "disks",
        nodes: vec![Node::new(
            "gcp:disk:d-1",
            NodeKind::GcpPersistentDisk,
            json!({"name": "d-1", "users": ["zones/z/instances/vm-1"]}),
        )],
        delay: Duration::ZERO,
    };
    (vms, disks)
}

#[tokio::test]
async fn test_build_infers_edges_across_populators() {
    let (vms, disks) = vm_and_disk();
    let populators: Vec<Arc<dyn Populator>> = vec![Arc::new(vms), Arc::new(disks)];
    let orchestrator = GraphBuildOrchestrator::new(populators);

    let (graph, report) = orchestrator.build().await.unwrap();

    // The disk populator finishes first; inference still sees the vm
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(report.stats.edges, 1);
    assert_eq!(report.inference.edges, 1);
    assert_eq!(report.populators, vec!["vms", "disks"]);
}

#[tokio::test]
async fn test_run_cycle_persists_snapshot() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph.json");
    let (vms, disks) = vm_and_disk();
    let populators: Vec<Arc<dyn Populator>> = vec![Arc::new(vms), Arc::new(disks)];
    let orchestrator = GraphBuildOrchestrator::new(populators);

    let report = orchestrator.run_cycle(&path).await.unwrap();

    assert_eq!(report.stats.nodes, 2);
    let loaded = Graph::load(&path).unwrap();
    assert_eq!(loaded.edge_count(), 1);
}

#[tokio::test]
async fn test_failing_populator_cancels_siblings() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph.json");
    let (slow, finished, dropped) = slow();
    let populators: Vec<Arc<dyn Populator>> = vec![Arc::new(slow), Arc::new(FailingPopulator)];
    let orchestrator = GraphBuildOrchestrator::new(populators);

    let result = orchestrator.run_cycle(&path).await;

    match result {
        Err(BuildError::Populator(e)) => {
            assert_eq!(e.plugin, "broken");
            assert!(e.message.contains("quota"));
        }
        other => panic!("expected populator failure, got {:?}", other.map(|r| r.stats)),
    }
    assert!(dropped.load(Ordering::SeqCst));
    assert!(!finished.load(Ordering::SeqCst));
    assert!(!path.exists());
}

#[tokio::test]
async fn test_failed_build_keeps_previous_snapshot() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("graph.json");
    let (vms, disks) = vm_and_disk();
    let populators: Vec<Arc<dyn Populator>> = vec![Arc::new(vms), Arc::new(disks)];
    GraphBuildOrchestrator::new(populators)
        .run_cycle(&path)
        .await
        .unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let failing: Arc<dyn Populator> = Arc::new(FailingPopulator);
    let result = GraphBuildOrchestrator::new(vec![failing])
        .run_cycle(&path)
        .await;

    assert!(result.is_err());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn test_panicking_populator_fails_build() {
    let (slow, _finished, dropped) = slow();
    let populators: Vec<Arc<dyn Populator>> = vec![Arc::new(slow), Arc::new(PanickingPopulator)];
    let orchestrator = GraphBuildOrchestrator::new(populators);

    let result = orchestrator.build().await;

    match result {
        Err(BuildError::PopulatorPanicked { plugin, message }) => {
            assert_eq!(plugin, "panicky");
            assert_eq!(message, "unexpected payload");
        }
        other => panic!("expected panic failure, got {:?}", other.map(|(_, r)| r.stats)),
    }
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_timeout_cancels_populators() {
    let (slow, finished, dropped) = slow();
    let slow: Arc<dyn Populator> = Arc::new(slow);
    let orchestrator = GraphBuildOrchestrator::new(vec![slow])
        .with_timeout(Some(Duration::from_millis(50)));

    let result = orchestrator.build().await;

    let err = result.err().unwrap();
    assert!(matches!(err, BuildError::Timeout(d) if d == Duration::from_millis(50)));
    assert_eq!(err.to_string(), "Build exceeded timeout of 50ms");
    // Aborted tasks are dropped once the runtime gets to them
    for _ in 0..100 {
        if dropped.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(dropped.load(Ordering::SeqCst));
    assert!(!finished.load(Ordering::SeqCst));
}

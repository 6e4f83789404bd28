//! Default consumer of the test tree.
//!
//! Walks the nodes in order and runs every leaf exactly once. Inside a
//! container the first child (the feature's `Start Feature` leaf) runs
//! alone; its remaining siblings may then run concurrently, bounded by the
//! worker count. A failing leaf never stops its siblings.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use scenic_core::tree::{DynamicTest, TestNode};

/// Outcome of one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LeafStatus {
    Passed,
    Failed { message: String },
}

impl LeafStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Report for one executed leaf.
#[derive(Debug, Clone, Serialize)]
pub struct LeafReport {
    /// Names of the enclosing containers, outermost first.
    pub path: Vec<String>,
    pub name: String,
    pub source: Option<String>,
    #[serde(flatten)]
    pub status: LeafStatus,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl LeafReport {
    /// `container / ... / leaf`
    pub fn display_name(&self) -> String {
        self.path
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// Results of a whole tree run, in tree order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub leaves: Vec<LeafReport>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.leaves.iter().filter(|l| l.status.is_passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.leaves.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &LeafReport> {
        self.leaves.iter().filter(|l| !l.status.is_passed())
    }

    /// Find a leaf by name (first match in tree order).
    pub fn leaf(&self, name: &str) -> Option<&LeafReport> {
        self.leaves.iter().find(|l| l.name == name)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for leaf in &self.leaves {
            match &leaf.status {
                LeafStatus::Passed => writeln!(f, "  PASS  {}", leaf.display_name())?,
                LeafStatus::Failed { message } => {
                    writeln!(f, "  FAIL  {}", leaf.display_name())?;
                    writeln!(f, "        {message}")?;
                }
            }
        }
        write!(
            f,
            "{} leaves: {} passed, {} failed",
            self.leaves.len(),
            self.passed(),
            self.failed()
        )
    }
}

/// Run the tree with one worker.
pub async fn run_tree(nodes: Vec<TestNode>) -> RunReport {
    run_tree_with(nodes, 1).await
}

/// Run the tree, letting up to `workers` sibling leaves run at once.
pub async fn run_tree_with(nodes: Vec<TestNode>, workers: usize) -> RunReport {
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut report = RunReport::default();
    for node in nodes {
        run_node(node, Vec::new(), Arc::clone(&permits), &mut report.leaves).await;
    }
    tracing::info!(
        passed = report.passed(),
        failed = report.failed(),
        "test tree finished"
    );
    report
}

fn run_node<'a>(
    node: TestNode,
    path: Vec<String>,
    permits: Arc<Semaphore>,
    out: &'a mut Vec<LeafReport>,
) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        match node {
            TestNode::Test(test) => out.push(run_leaf(test, path).await),
            TestNode::Container(container) => {
                let mut child_path = path;
                child_path.push(container.name().to_owned());

                let mut children = container.into_children().into_iter();
                if let Some(first) = children.next() {
                    run_node(first, child_path.clone(), Arc::clone(&permits), out).await;
                }
                run_siblings(children.collect(), child_path, permits, out).await;
            }
        }
    })
}

/// Leaves run concurrently; nested containers run in order after them.
async fn run_siblings(
    siblings: Vec<TestNode>,
    path: Vec<String>,
    permits: Arc<Semaphore>,
    out: &mut Vec<LeafReport>,
) {
    let mut slots: Vec<Option<Vec<LeafReport>>> = Vec::with_capacity(siblings.len());
    let mut nested = Vec::new();
    let mut tasks = JoinSet::new();

    for (index, node) in siblings.into_iter().enumerate() {
        slots.push(None);
        match node {
            TestNode::Test(test) => {
                let path = path.clone();
                let permits = Arc::clone(&permits);
                tasks.spawn(async move {
                    // the semaphore is never closed
                    let _permit = permits.acquire_owned().await.ok();
                    (index, run_leaf(test, path).await)
                });
            }
            container @ TestNode::Container(_) => nested.push((index, container)),
        }
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, report)) => slots[index] = Some(vec![report]),
            Err(e) => tracing::error!(error = %e, "leaf task did not complete"),
        }
    }
    for (index, container) in nested {
        let mut reports = Vec::new();
        run_node(container, path.clone(), Arc::clone(&permits), &mut reports).await;
        slots[index] = Some(reports);
    }

    out.extend(slots.into_iter().flatten().flatten());
}

async fn run_leaf(test: DynamicTest, path: Vec<String>) -> LeafReport {
    let name = test.name().to_owned();
    let source = test.source().map(ToString::to_string);
    let started = Instant::now();

    let status = match test.run().await {
        Ok(()) => LeafStatus::Passed,
        Err(failure) => LeafStatus::Failed {
            message: failure.to_string(),
        },
    };
    tracing::debug!(leaf = %name, passed = status.is_passed(), "leaf finished");

    LeafReport {
        path,
        name,
        source,
        status,
        elapsed: started.elapsed(),
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

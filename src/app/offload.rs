use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::Vec2;

use crate::kg::GraphSnapshot;
use crate::layout::force_layout;

/// Snapshots larger than this get their layout computed off-thread.
pub const OFFLOAD_NODE_THRESHOLD: usize = 1000;
const OFFLOAD_ITERATIONS: usize = 200;

/// Minimal projection submitted to the worker; never the full records.
pub struct LayoutRequest {
    pub ids: Vec<String>,
    pub edges: Vec<(usize, usize)>,
}

pub struct LayoutUpdate {
    pub positions: Vec<(String, Vec2)>,
}

struct OffloadTask {
    rx: Receiver<LayoutUpdate>,
    version: u64,
}

/// Single-slot request/response channel to the layout worker. At most one
/// offload is ever in flight; the slot is released on completion, worker
/// disconnect, and stale-version results alike.
pub struct LayoutOffload {
    task: Option<OffloadTask>,
}

impl LayoutOffload {
    pub fn new() -> Self {
        Self { task: None }
    }

    pub fn in_flight(&self) -> bool {
        self.task.is_some()
    }

    /// Submits the snapshot if it is large enough and the slot is free.
    pub fn maybe_submit(&mut self, snapshot: &GraphSnapshot) -> bool {
        if snapshot.node_count() <= OFFLOAD_NODE_THRESHOLD {
            return false;
        }
        let request = Self::project(snapshot);
        let submitted = self.submit_with(snapshot.version, request, |request| {
            let positions = force_layout(&request.ids, &request.edges, OFFLOAD_ITERATIONS);
            LayoutUpdate {
                positions: request.ids.into_iter().zip(positions).collect(),
            }
        });
        if submitted {
            log::debug!(
                "layout offload started for snapshot v{} ({} nodes)",
                snapshot.version,
                snapshot.node_count()
            );
        }
        submitted
    }

    fn project(snapshot: &GraphSnapshot) -> LayoutRequest {
        LayoutRequest {
            ids: snapshot.nodes.iter().map(|node| node.id.clone()).collect(),
            edges: snapshot
                .links
                .iter()
                .map(|link| (link.source, link.target))
                .collect(),
        }
    }

    fn submit_with<F>(&mut self, version: u64, request: LayoutRequest, solve: F) -> bool
    where
        F: FnOnce(LayoutRequest) -> LayoutUpdate + Send + 'static,
    {
        if self.task.is_some() {
            return false;
        }
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(solve(request));
        });
        self.task = Some(OffloadTask { rx, version });
        true
    }

    /// Non-blocking poll; merges returned positions by id when the result
    /// still matches the displayed snapshot. Returns true after a merge.
    pub fn poll(&mut self, snapshot: &mut GraphSnapshot) -> bool {
        let Some(task) = self.task.take() else {
            return false;
        };

        match task.rx.try_recv() {
            Ok(update) => {
                if task.version != snapshot.version {
                    log::debug!(
                        "discarding layout result for stale snapshot v{}",
                        task.version
                    );
                    return false;
                }
                for (id, pos) in update.positions {
                    if let Some(index) = snapshot.node_index(&id) {
                        snapshot.nodes[index].pos = pos;
                    }
                }
                true
            }
            Err(TryRecvError::Empty) => {
                self.task = Some(task);
                false
            }
            Err(TryRecvError::Disconnected) => {
                log::warn!("layout worker disconnected before completion");
                false
            }
        }
    }
}

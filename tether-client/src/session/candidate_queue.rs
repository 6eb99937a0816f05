use crate::transport::TransportEngine;
use std::collections::VecDeque;
use tether_core::IceCandidate;
use tracing::{debug, warn};

/// Remote candidates that arrived before the remote descriptor was applied.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    pending: VecDeque<IceCandidate>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, candidate: IceCandidate) {
        self.pending.push_back(candidate);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Hand every queued candidate to `engine` in arrival order.
    ///
    /// A rejected candidate is logged and skipped. Returns how many were
    /// handed over.
    pub async fn drain_into(&mut self, engine: &dyn TransportEngine) -> usize {
        let mut drained = 0;
        while let Some(candidate) = self.pending.pop_front() {
            if let Err(e) = engine.add_remote_candidate(candidate.clone()).await {
                warn!("Engine rejected queued candidate {}: {}", candidate, e);
            }
            drained += 1;
        }
        if drained > 0 {
            debug!("Drained {} queued candidates", drained);
        }
        drained
    }
}

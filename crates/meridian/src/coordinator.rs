//! Latest-request-wins coordination.
//!
//! Each request category carries at most one in-flight request. Starting a
//! new one cancels the previous request's token and bumps the category's
//! sequence number; a result may only be committed while the sequence still
//! names its ticket. Completion order over the network is irrelevant, the
//! sequence check at the commit point is the whole correctness story.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The two request lanes the pipeline multiplexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestCategory {
    /// Per-keystroke suggestion fetches.
    Suggest,
    /// Submit/commit resolution fetches.
    Resolve,
}

/// Handle for one issued request. Carries the cancellation token threaded
/// through every network call made on its behalf.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub category: RequestCategory,
    pub seq: u64,
    pub cancel: CancellationToken,
}

impl RequestTicket {
    /// Wait out a debounce window. Returns `false` if a newer request in the
    /// same category superseded this one while waiting.
    pub async fn debounce(&self, window: Duration) -> bool {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(window) => true,
        }
    }
}

#[derive(Debug)]
struct Lane {
    seq: u64,
    token: CancellationToken,
}

impl Lane {
    fn new() -> Self {
        Self {
            seq: 0,
            token: CancellationToken::new(),
        }
    }
}

/// Tracks the active request per category.
#[derive(Debug)]
pub struct RequestCoordinator {
    suggest: Lane,
    resolve: Lane,
}

impl RequestCoordinator {
    pub fn new() -> Self {
        Self {
            suggest: Lane::new(),
            resolve: Lane::new(),
        }
    }

    /// Start a new request: cancel the category's in-flight request (if any)
    /// and hand out the ticket that now owns the lane.
    pub fn begin(&mut self, category: RequestCategory) -> RequestTicket {
        let lane = self.lane_mut(category);
        lane.token.cancel();
        lane.token = CancellationToken::new();
        lane.seq += 1;
        debug!(?category, seq = lane.seq, "request lane advanced");
        RequestTicket {
            category,
            seq: lane.seq,
            cancel: lane.token.clone(),
        }
    }

    /// Whether this ticket still owns its lane. Checked before every commit.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.lane(ticket.category).seq == ticket.seq
    }

    pub fn current_seq(&self, category: RequestCategory) -> u64 {
        self.lane(category).seq
    }

    /// Cancel both lanes without issuing new tickets. Used at teardown.
    pub fn cancel_all(&mut self) {
        self.suggest.token.cancel();
        self.resolve.token.cancel();
        self.suggest.seq += 1;
        self.resolve.seq += 1;
    }

    const fn lane(&self, category: RequestCategory) -> &Lane {
        match category {
            RequestCategory::Suggest => &self.suggest,
            RequestCategory::Resolve => &self.resolve,
        }
    }

    const fn lane_mut(&mut self, category: RequestCategory) -> &mut Lane {
        match category {
            RequestCategory::Suggest => &mut self.suggest,
            RequestCategory::Resolve => &mut self.resolve,
        }
    }
}

impl Default for RequestCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

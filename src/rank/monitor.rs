/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Shared state observed by the signal reporter.
//!
//! A [`Monitor`] is the rendezvous point between a running
//! [`PageRank`](crate::rank::PageRank) computation and the
//! [`Reporter`](crate::reporter::Reporter): a mutex protecting the iteration
//! counter and a handle to the rank buffers. The engine bumps the counter and
//! flips the buffer parity under the mutex at the end of each iteration, and
//! clears the handle on completion; the reporter takes consistent snapshots
//! through [`status`](Monitor::status).

use std::sync::{Arc, Mutex};
use sync_cell_slice::SyncCell;

/// The two rank buffers of a running computation.
///
/// Buffers alternate roles by iteration parity: iteration *t* reads the
/// buffer of parity *t* − 1 and writes the buffer of parity *t*. Entries are
/// [`SyncCell`]s so that workers can write disjoint intervals of the current
/// buffer while the reporter reads the previous one.
pub(crate) struct RankVectors {
    pub(crate) bufs: [Box<[SyncCell<f64>]>; 2],
}

impl RankVectors {
    pub(crate) fn new(n: usize, init: f64) -> Self {
        let make = || (0..n).map(|_| SyncCell::new(init)).collect();
        Self {
            bufs: [make(), make()],
        }
    }

    /// Consumes the buffers, returning the one of parity `parity`.
    pub(crate) fn into_rank(self, parity: usize) -> Box<[f64]> {
        let [even, odd] = self.bufs;
        let buf = if parity == 0 { even } else { odd };
        buf.into_vec().into_iter().map(SyncCell::into_inner).collect()
    }
}

struct Live {
    vectors: Arc<RankVectors>,
    /// Parity of the buffer holding the last completed iteration.
    prev: usize,
}

#[derive(Default)]
struct MonitorInner {
    iteration: usize,
    live: Option<Live>,
}

/// A snapshot of the state of a computation, as returned by
/// [`Monitor::status`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    /// No iteration has completed yet.
    NotStarted,
    /// The computation is running; `node` is the currently top-ranked node.
    Running {
        iteration: usize,
        node: usize,
        rank: f64,
    },
    /// The computation has terminated.
    Completed,
}

/// Shared state handle between a rank computation and the signal reporter.
pub struct Monitor {
    inner: Mutex<MonitorInner>,
}

impl Monitor {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MonitorInner::default()),
        }
    }

    /// Returns a consistent snapshot of the computation state.
    ///
    /// While the computation runs, the snapshot scans the last completed rank
    /// vector for its maximum; ties are broken towards the earliest node.
    pub fn status(&self) -> Status {
        let inner = self.inner.lock().unwrap();
        if inner.iteration == 0 {
            return Status::NotStarted;
        }
        match &inner.live {
            None => Status::Completed,
            Some(live) => {
                let ranks = &live.vectors.bufs[live.prev];
                let mut node = 0;
                // SAFETY: workers only write the buffer of the parity
                // opposite to `prev`, and `prev` is flipped only under this
                // mutex, so the buffer we scan is stable while we hold it.
                let mut rank = unsafe { ranks[0].get() };
                for (i, cell) in ranks.iter().enumerate().skip(1) {
                    let r = unsafe { cell.get() };
                    if r > rank {
                        rank = r;
                        node = i;
                    }
                }
                Status::Running {
                    iteration: inner.iteration,
                    node,
                    rank,
                }
            }
        }
    }

    /// Hooks the rank buffers of a starting computation, resetting the
    /// iteration counter.
    pub(crate) fn install(&self, vectors: Arc<RankVectors>) {
        let mut inner = self.inner.lock().unwrap();
        inner.iteration = 0;
        inner.live = Some(Live { vectors, prev: 0 });
    }

    /// Records the completion of an iteration: flips the buffer parity, or,
    /// if the computation is done, drops the buffer handle so that
    /// [`status`](Monitor::status) reports completion.
    pub(crate) fn advance(&self, done: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.iteration += 1;
        if done {
            inner.live = None;
        } else if let Some(live) = &mut inner.live {
            live.prev ^= 1;
        }
    }

    /// Returns the number of completed iterations.
    pub(crate) fn iterations(&self) -> usize {
        self.inner.lock().unwrap().iteration
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}

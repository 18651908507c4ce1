/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The two-phase barrier synchronizing the rank workers.
//!
//! Each iteration of the engine has two phases with a rendezvous after each:
//! after phase Y every worker has filled its interval of the scaled-rank
//! vector, and after phase X every worker has written its interval of the
//! new rank vector. The barrier is a classic generation-counting rendezvous
//! over one mutex and one condition variable, with a twist: the phase-X
//! rendezvous folds the workers' local error and dangling-mass contributions
//! under the barrier mutex, and the last worker to arrive runs a commit
//! closure — deciding termination and publishing the iteration — *before*
//! broadcasting, so every waiter resumes with the committed
//! [`Outcome`] in hand.
//!
//! The commit closure may take further locks (the engine takes the
//! [`Monitor`](crate::rank::Monitor) mutex to publish the buffer swap); such
//! locks must never be held while waiting on the barrier.

use std::sync::{Condvar, Mutex};

/// What the last arriver of a phase-X rendezvous decided.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Outcome {
    /// The dangling mass to be used by the next iteration.
    pub(crate) dangling: f64,
    /// Whether the workers should stop.
    pub(crate) done: bool,
}

struct State {
    arrived: usize,
    generation: u64,
    /// Folded error contributions of the current iteration.
    err: f64,
    /// Folded dangling-mass contributions of the current iteration.
    dangling: f64,
    outcome: Outcome,
}

pub(crate) struct PhaseBarrier {
    parties: usize,
    state: Mutex<State>,
    cond: Condvar,
}

impl PhaseBarrier {
    /// Creates a barrier for `parties` workers; `dangling` is the dangling
    /// mass for the first iteration.
    pub(crate) fn new(parties: usize, dangling: f64) -> Self {
        Self {
            parties,
            state: Mutex::new(State {
                arrived: 0,
                generation: 0,
                err: 0.0,
                dangling: 0.0,
                outcome: Outcome {
                    dangling,
                    done: false,
                },
            }),
            cond: Condvar::new(),
        }
    }

    /// Rendezvous ending phase Y. Returns the dangling mass to be used in
    /// phase X.
    pub(crate) fn finish_y(&self) -> f64 {
        let mut state = self.state.lock().unwrap();
        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation += 1;
            self.cond.notify_all();
        } else {
            while state.generation == generation {
                state = self.cond.wait(state).unwrap();
            }
        }
        state.outcome.dangling
    }

    /// Rendezvous ending phase X.
    ///
    /// Folds the local error and dangling-mass contributions; the last
    /// arriver calls `commit` with the total error while holding the barrier
    /// mutex, and its return value decides whether the workers stop. The
    /// folded dangling mass becomes the dangling mass of the next iteration.
    pub(crate) fn finish_x(
        &self,
        local_err: f64,
        local_dangling: f64,
        commit: impl FnOnce(f64) -> bool,
    ) -> Outcome {
        let mut state = self.state.lock().unwrap();
        let generation = state.generation;
        state.err += local_err;
        state.dangling += local_dangling;
        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            let done = commit(state.err);
            state.outcome = Outcome {
                dangling: state.dangling,
                done,
            };
            state.err = 0.0;
            state.dangling = 0.0;
            state.generation += 1;
            self.cond.notify_all();
        } else {
            while state.generation == generation {
                state = self.cond.wait(state).unwrap();
            }
        }
        state.outcome
    }
}

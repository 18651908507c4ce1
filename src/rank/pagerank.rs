/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parallel PageRank by damped power iteration.
//!
//! This implementation follows the random-surfer model of the original
//! PageRank paper: with probability *d* (the damping factor) the surfer
//! follows an outgoing arc of the current node, and with probability 1 − *d*
//! it teleports to a node chosen uniformly at random. Nodes without outgoing
//! arcs (*dangling* nodes) donate their rank uniformly to all nodes.
//!
//! # The iteration
//!
//! Let *n* be the number of nodes and *S* the *dangling mass*, that is, the
//! sum of the previous ranks over all dangling nodes. Each iteration computes
//! the new rank of node *j* as
//!
//! > *x*′(*j*) = (1 − *d*)/*n*  +  *d* · ∑_{*i* → *j*} *x*(*i*)/*outdegree*(*i*)  +  (*d*/*n*) · *S*
//!
//! and the iteration error as the ℓ₁ distance ∑_{*j*} |*x*′(*j*) − *x*(*j*)|.
//!
//! # Parallelism
//!
//! Each worker owns a contiguous interval of nodes, and every iteration runs
//! in two phases separated by a barrier: in phase Y
//! the worker divides the previous ranks of its interval by the out-degrees,
//! so that in phase X the new rank of a node can be computed by just summing
//! the scaled ranks of its predecessors — writes and reads are decoupled and
//! the hot loop needs no locking. The rank vectors alternate by iteration
//! parity instead of being copied, and the error and dangling-mass
//! accumulations are folded into phase X to save a sweep.
//!
//! The last worker reaching the phase-X barrier evaluates the stopping
//! [predicate](preds) and publishes the parity flip to the
//! [`Monitor`](crate::rank::Monitor) shared with the signal reporter.
//!
//! # Stopping criteria
//!
//! The [`run`](PageRank::run) method accepts a composable [`Predicate`]
//! receiving the iteration number and the ℓ₁ error; see [`preds`].

pub mod preds {
    //! Predicates implementing stopping conditions.
    //!
    //! The implementation of [PageRank](super::PageRank) requires a
    //! [predicate](Predicate) to stop the algorithm. This module provides a
    //! few such predicates: they evaluate to true if the computation should
    //! be stopped.
    //!
    //! You can combine the predicates using the `and` and `or` methods
    //! provided by the [`Predicate`] trait.
    //!
    //! # Examples
    //! ```
    //! # fn main() -> Result<(), Box<dyn std::error::Error>> {
    //! use predicates::prelude::*;
    //! use mtxrank::rank::pagerank::preds::{L1Norm, MaxIter};
    //!
    //! let predicate = L1Norm::try_from(1E-7)?.or(MaxIter::from(100));
    //! #     let _ = predicate;
    //! #     Ok(())
    //! # }
    //! ```

    use anyhow::ensure;
    use predicates::reflection::PredicateReflection;
    use predicates::Predicate;
    use std::fmt::Display;

    #[doc(hidden)]
    /// This structure is passed to stopping predicates to provide the
    /// information that is needed to evaluate them.
    #[derive(Debug)]
    pub struct PredParams {
        pub iteration: usize,
        pub err: f64,
    }

    /// Stops after at most the provided number of iterations.
    #[derive(Debug, Clone)]
    pub struct MaxIter {
        max_iter: usize,
    }

    impl MaxIter {
        pub const DEFAULT_MAX_ITER: usize = 100;
    }

    impl From<usize> for MaxIter {
        fn from(max_iter: usize) -> Self {
            MaxIter { max_iter }
        }
    }

    impl Default for MaxIter {
        fn default() -> Self {
            Self::from(Self::DEFAULT_MAX_ITER)
        }
    }

    impl Display for MaxIter {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!("(max iter: {})", self.max_iter))
        }
    }

    impl PredicateReflection for MaxIter {}

    impl Predicate<PredParams> for MaxIter {
        fn eval(&self, pred_params: &PredParams) -> bool {
            pred_params.iteration >= self.max_iter
        }
    }

    /// Stops when the ℓ₁ distance between successive approximations falls
    /// strictly below a given threshold.
    ///
    /// A zero threshold is accepted: the comparison is strict, so the
    /// computation then runs until another predicate stops it.
    #[derive(Debug, Clone)]
    pub struct L1Norm {
        threshold: f64,
    }

    impl L1Norm {
        pub const DEFAULT_THRESHOLD: f64 = 1E-7;
    }

    impl TryFrom<f64> for L1Norm {
        type Error = anyhow::Error;
        fn try_from(threshold: f64) -> anyhow::Result<Self> {
            ensure!(!threshold.is_nan());
            ensure!(threshold >= 0.0, "The threshold must be nonnegative");
            Ok(L1Norm { threshold })
        }
    }

    impl Default for L1Norm {
        fn default() -> Self {
            Self::try_from(Self::DEFAULT_THRESHOLD).unwrap()
        }
    }

    impl Display for L1Norm {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_fmt(format_args!("(error: {})", self.threshold))
        }
    }

    impl PredicateReflection for L1Norm {}
    impl Predicate<PredParams> for L1Norm {
        fn eval(&self, pred_params: &PredParams) -> bool {
            pred_params.err < self.threshold
        }
    }
}

use crate::graph::Graph;
use crate::rank::barrier::PhaseBarrier;
use crate::rank::monitor::{Monitor, RankVectors};
use crate::utils::partition::intervals;
use kahan::KahanSum;
use predicates::Predicate;
use std::sync::Arc;
use sync_cell_slice::SyncSlice;

/// Computes PageRank with a pool of barrier-synchronized workers.
///
/// The struct is configured via setters and then executed via
/// [`run`](Self::run). After completion the rank vector is available via the
/// [`rank`](Self::rank) method and the number of performed iterations via
/// [`iterations`](Self::iterations).
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use predicates::prelude::*;
/// use mtxrank::graph::Graph;
/// use mtxrank::rank::pagerank::{preds, PageRank};
///
/// // A two-node cycle.
/// let graph = Graph::read_mtx(std::io::Cursor::new("2 2 2\n1 2\n2 1\n"), 2)?;
///
/// let mut pr = PageRank::new(&graph);
/// pr.damping(0.9).num_threads(2);
/// pr.run(preds::L1Norm::try_from(1E-9)?.or(preds::MaxIter::from(100)));
///
/// assert!(pr.rank().iter().all(|&r| (r - 0.5).abs() < 1E-9));
/// #     Ok(())
/// # }
/// ```
pub struct PageRank<'a> {
    graph: &'a Graph,
    damping: f64,
    num_threads: usize,
    rank: Box<[f64]>,
    iterations: usize,
}

impl std::fmt::Debug for PageRank<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRank")
            .field("damping", &self.damping)
            .field("num_threads", &self.num_threads)
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

impl<'a> PageRank<'a> {
    /// Creates a new PageRank computation with default parameters (damping
    /// factor 0.9, three threads).
    pub fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            damping: 0.9,
            num_threads: 3,
            rank: Box::new([]),
            iterations: 0,
        }
    }

    /// Sets the damping factor *d*.
    ///
    /// # Panics
    ///
    /// Panics if `damping` is not in the open interval (0 . . 1).
    pub fn damping(&mut self, damping: f64) -> &mut Self {
        assert!(
            damping > 0.0 && damping < 1.0,
            "The damping factor must be in (0 . . 1), got {damping}"
        );
        self.damping = damping;
        self
    }

    /// Sets the number of worker threads.
    ///
    /// More threads than nodes is allowed, albeit wasteful: the surplus
    /// workers idle through the barriers.
    ///
    /// # Panics
    ///
    /// Panics if `num_threads` is zero.
    pub fn num_threads(&mut self, num_threads: usize) -> &mut Self {
        assert!(num_threads > 0, "The number of threads must be positive");
        self.num_threads = num_threads;
        self
    }

    /// Returns the rank vector computed by the last call to
    /// [`run`](Self::run).
    pub fn rank(&self) -> &[f64] {
        &self.rank
    }

    /// Returns the number of iterations performed by the last call to
    /// [`run`](Self::run).
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Runs the computation until the given predicate is satisfied.
    ///
    /// Note that the predicate is the only stopping condition: combine with
    /// [`preds::MaxIter`] to bound the number of iterations.
    pub fn run(&mut self, predicate: impl Predicate<preds::PredParams> + Sync) {
        self.run_with_monitor(predicate, &Monitor::new());
    }

    /// Runs the computation until the given predicate is satisfied,
    /// publishing per-iteration progress to `monitor`.
    pub fn run_with_monitor(
        &mut self,
        predicate: impl Predicate<preds::PredParams> + Sync,
        monitor: &Monitor,
    ) {
        let graph = self.graph;
        let n = graph.num_nodes();
        if n == 0 {
            return;
        }
        let damping = self.damping;
        let num_threads = self.num_threads;
        let inv_n = 1.0 / n as f64;

        log::info!("Damping factor: {}", damping);
        log::info!("Stopping criterion: {}", predicate);

        let vectors = Arc::new(RankVectors::new(n, inv_n));
        monitor.install(Arc::clone(&vectors));

        let mut y = vec![0.0; n].into_boxed_slice();
        let y = y.as_sync_slice();
        let bufs = [&vectors.bufs[0][..], &vectors.bufs[1][..]];

        let barrier = PhaseBarrier::new(num_threads, graph.num_dangling() as f64 * inv_n);
        let barrier = &barrier;
        let predicate = &predicate;

        std::thread::scope(|scope| {
            for range in intervals(n, num_threads) {
                scope.spawn(move || {
                    let teleport = (1.0 - damping) * inv_n;
                    let mut iteration = 0;
                    loop {
                        iteration += 1;
                        let prev = bufs[(iteration - 1) & 1];
                        let curr = bufs[iteration & 1];

                        // Phase Y: scale the previous ranks by the out-degrees.
                        // Entries of dangling nodes stay zero.
                        for i in range.clone() {
                            let outdegree = graph.outdegree(i);
                            if outdegree > 0 {
                                // SAFETY: each worker writes only its own
                                // interval of Y, and nobody reads Y before the
                                // barrier below.
                                unsafe { y[i].set(prev[i].get() / outdegree as f64) };
                            }
                        }

                        let dangling = barrier.finish_y();

                        // Phase X: new ranks, with interval-local error and
                        // dangling mass.
                        let mut err: KahanSum<f64> = KahanSum::new();
                        let mut next_dangling: KahanSum<f64> = KahanSum::new();
                        for i in range.clone() {
                            let mut sum = 0.0;
                            // SAFETY: Y is complete and read-only during
                            // phase X.
                            for &pred in graph.predecessors(i) {
                                sum += unsafe { y[pred].get() };
                            }
                            let rank = teleport + damping * sum + damping * inv_n * dangling;
                            // SAFETY: each worker writes only its own interval
                            // of the current buffer; the previous buffer is
                            // read-only until the commit below.
                            let prev_rank = unsafe { prev[i].get() };
                            unsafe { curr[i].set(rank) };
                            err += (rank - prev_rank).abs();
                            if graph.is_dangling(i) {
                                next_dangling += rank;
                            }
                        }

                        let outcome =
                            barrier.finish_x(err.sum(), next_dangling.sum(), |err| {
                                let done =
                                    predicate.eval(&preds::PredParams { iteration, err });
                                log::debug!("iteration {}: error = {}", iteration, err);
                                // Publishes the parity flip to the reporter;
                                // on the last iteration this clears its view
                                // of the buffers instead.
                                monitor.advance(done);
                                done
                            });
                        if outcome.done {
                            break;
                        }
                    }
                });
            }
        });

        self.iterations = monitor.iterations();
        self.rank = Arc::into_inner(vectors)
            .expect("the rank buffers outlived the computation")
            .into_rank(self.iterations & 1);
        log::info!("Completed after {} iterations", self.iterations);
    }
}

/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The in-memory graph model.
//!
//! A [`Graph`] stores, for each node, the sorted and duplicate-free list of
//! its *predecessors* (the origins of its incoming arcs), the out-degree of
//! each node, and the list of *dangling* nodes (nodes without outgoing
//! arcs), whose rank must be redistributed uniformly at each iteration.
//!
//! Graphs are built by the parallel ingestion pipeline (see
//! [`Graph::from_mtx`]) and are immutable afterwards; in particular they can
//! be shared freely among the rank-computation workers.

mod ingest;

use anyhow::{Context, Result};
use std::io::Write;

/// An immutable directed graph represented by predecessor lists.
///
/// Node identifiers are 0-based and contiguous. Every predecessor list is
/// strictly ascending and contains no self-loops, so two graphs built from
/// equivalent inputs compare equal.
#[derive(Clone, PartialEq, Eq)]
pub struct Graph {
    /// For each node, the sorted list of origins of its incoming arcs.
    preds: Box<[Box<[usize]>]>,
    /// For each node, the number of its outgoing arcs.
    outdegrees: Box<[usize]>,
    /// The ascending list of nodes with no outgoing arcs.
    dangling: Box<[usize]>,
    /// The number of arcs surviving filtering and deduplication.
    num_arcs: usize,
}

impl Graph {
    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.preds.len()
    }

    /// Returns the number of valid arcs, that is, arcs that are not
    /// self-loops, fall within the node range, and appear at least once.
    pub fn num_arcs(&self) -> usize {
        self.num_arcs
    }

    /// Returns the sorted list of predecessors of `node`.
    pub fn predecessors(&self, node: usize) -> &[usize] {
        &self.preds[node]
    }

    /// Returns the out-degree of `node`.
    pub fn outdegree(&self, node: usize) -> usize {
        self.outdegrees[node]
    }

    /// Returns true if `node` has no outgoing arcs.
    pub fn is_dangling(&self, node: usize) -> bool {
        self.outdegrees[node] == 0
    }

    /// Returns the ascending list of dangling nodes.
    pub fn dangling(&self) -> &[usize] {
        &self.dangling
    }

    /// Returns the number of dangling nodes.
    pub fn num_dangling(&self) -> usize {
        self.dangling.len()
    }

    /// Writes the graph as a Matrix Market coordinate document.
    ///
    /// Arcs are emitted with 1-based identifiers, grouped by destination and
    /// ascending within each group, so the output is canonical: two graphs
    /// compare equal if and only if their output is byte-identical. The
    /// output can be parsed back by [`Graph::from_mtx`].
    pub fn write_canonical<W: Write>(&self, writer: &mut W) -> Result<()> {
        let n = self.num_nodes();
        writeln!(writer, "{} {} {}", n, n, self.num_arcs).context("writing header")?;
        for (dst, preds) in self.preds.iter().enumerate() {
            for &src in preds.iter() {
                writeln!(writer, "{} {}", src + 1, dst + 1).context("writing arc")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("num_nodes", &self.num_nodes())
            .field("num_arcs", &self.num_arcs)
            .field("num_dangling", &self.dangling.len())
            .finish_non_exhaustive()
    }
}

/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Parallel ingestion of Matrix Market coordinate files.
//!
//! Ingestion runs in two phases. In the first phase the calling thread reads
//! and validates arc lines, updates the out-degree vector, and routes each
//! arc through a bounded channel to the worker owning the destination node,
//! which appends the origin to the destination's predecessor list; since a
//! destination is owned by exactly one worker, the lists need no locking. In
//! the second phase the same node partition is used to sort and deduplicate
//! every predecessor list in parallel; the origin of each removed duplicate
//! is streamed back to the calling thread, which decrements the
//! corresponding out-degree so that the arc count, the out-degree vector and
//! the predecessor lists stay consistent.
//!
//! Arcs that are self-loops or fall outside the node range are silently
//! discarded. Any line that is not exactly two integers aborts ingestion
//! with the offending line number.

use super::Graph;
use crate::utils::partition::{intervals, owner};
use anyhow::{bail, ensure, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use dsi_progress_logger::{no_logging, ProgressLog};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Capacity, in values, of the bounded buffers connecting pipeline stages.
///
/// The arc channels of the first phase hold pairs, so their capacity is half
/// of this.
const BUF_SIZE: usize = 4096;

/// Slots reserved in a predecessor list on first touch; lists then grow by
/// doubling.
const FIRST_TOUCH_CAPACITY: usize = 300;

impl Graph {
    /// Reads a graph from a Matrix Market coordinate file using
    /// `num_threads` worker threads.
    pub fn from_mtx(path: impl AsRef<Path>, num_threads: usize) -> Result<Self> {
        Self::from_mtx_with_logging(path, num_threads, no_logging![])
    }

    /// Reads a graph from a Matrix Market coordinate file using
    /// `num_threads` worker threads, logging progress with `pl`.
    pub fn from_mtx_with_logging(
        path: impl AsRef<Path>,
        num_threads: usize,
        pl: &mut impl ProgressLog,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        Self::read_mtx_with_logging(BufReader::new(file), num_threads, pl)
            .with_context(|| format!("parsing {}", path.display()))
    }

    /// Reads a graph in Matrix Market coordinate format.
    pub fn read_mtx(reader: impl BufRead, num_threads: usize) -> Result<Self> {
        Self::read_mtx_with_logging(reader, num_threads, no_logging![])
    }

    /// Reads a graph in Matrix Market coordinate format, logging progress
    /// with `pl`.
    pub fn read_mtx_with_logging(
        reader: impl BufRead,
        num_threads: usize,
        pl: &mut impl ProgressLog,
    ) -> Result<Self> {
        ensure!(num_threads > 0, "Number of threads must be greater than 0");

        let mut lines = reader.lines();
        let mut line_no = 0_usize;

        // Skip comments, then parse the header.
        let header = loop {
            line_no += 1;
            match lines.next() {
                None => bail!("missing header line"),
                Some(line) => {
                    let line = line.context("reading input")?;
                    if !line.starts_with('%') {
                        break line;
                    }
                }
            }
        };

        let mut tokens = header.split_ascii_whitespace();
        let (Some(rows), Some(cols), Some(declared), None) =
            (tokens.next(), tokens.next(), tokens.next(), tokens.next())
        else {
            bail!("invalid header at line {line_no}: expected three integers");
        };
        let (Ok(rows), Ok(cols), Ok(declared)) = (
            rows.parse::<usize>(),
            cols.parse::<usize>(),
            declared.parse::<usize>(),
        ) else {
            bail!("invalid header at line {line_no}: expected three integers");
        };
        ensure!(
            rows == cols,
            "invalid header at line {line_no}: the matrix must be square, got {rows}x{cols}"
        );
        ensure!(rows >= 1, "invalid header at line {line_no}: no nodes");

        let n = rows;
        let ranges = intervals(n, num_threads);
        let mut preds = vec![Vec::new(); n];
        let mut outdegrees = vec![0_usize; n];
        let mut inserted = 0;
        let mut arc_lines = 0;

        pl.item_name("arc");
        pl.expected_updates(Some(declared));
        pl.start("Reading arcs...");

        std::thread::scope(|scope| -> Result<()> {
            let mut senders = Vec::with_capacity(num_threads);
            let mut rest = preds.as_mut_slice();
            for range in &ranges {
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
                rest = tail;
                let (tx, rx) = bounded::<(usize, usize)>(BUF_SIZE / 2);
                senders.push(tx);
                let offset = range.start;
                scope.spawn(move || append_worker(chunk, offset, rx));
            }

            for line in &mut lines {
                line_no += 1;
                arc_lines += 1;
                let line = line.context("reading input")?;
                let mut tokens = line.split_ascii_whitespace();
                let (Some(src), Some(dst), None) = (tokens.next(), tokens.next(), tokens.next())
                else {
                    bail!("malformed arc at line {line_no}: expected two integers");
                };
                let (Ok(src), Ok(dst)) = (src.parse::<i64>(), dst.parse::<i64>()) else {
                    bail!("malformed arc at line {line_no}: expected two integers");
                };
                pl.light_update();

                // Self-loops and out-of-range arcs are silently discarded.
                if src == dst || src < 1 || dst < 1 || src > n as i64 || dst > n as i64 {
                    log::debug!("discarding arc ({src}, {dst}) at line {line_no}");
                    continue;
                }
                let (src, dst) = ((src - 1) as usize, (dst - 1) as usize);

                outdegrees[src] += 1;
                inserted += 1;
                senders[owner(dst, n, num_threads)].send((src, dst)).unwrap();
            }

            // Disconnects the channels so the workers exit.
            drop(senders);
            Ok(())
        })?;

        pl.done();

        if arc_lines != declared {
            log::warn!("the header declares {declared} arcs, but the file contains {arc_lines} arc lines");
        }

        pl.item_name("node");
        pl.expected_updates(Some(n));
        pl.start("Sorting and deduplicating predecessor lists...");

        let mut duplicates = 0;
        std::thread::scope(|scope| {
            let (dup_tx, dup_rx) = bounded::<usize>(BUF_SIZE);
            let mut rest = preds.as_mut_slice();
            for range in &ranges {
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
                rest = tail;
                let tx = dup_tx.clone();
                scope.spawn(move || dedup_worker(chunk, tx));
            }
            drop(dup_tx);

            // Reconcile out-degrees while the workers run; the channel
            // disconnects once every worker is finished.
            for dup in dup_rx {
                outdegrees[dup] -= 1;
                duplicates += 1;
            }
        });

        pl.done();

        let num_arcs = inserted - duplicates;
        let dangling: Box<[usize]> = outdegrees
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d == 0)
            .map(|(node, _)| node)
            .collect();

        log::info!(
            "{} nodes, {} arcs ({} declared), {} dangling nodes",
            n,
            num_arcs,
            declared,
            dangling.len()
        );

        Ok(Graph {
            preds: preds.into_iter().map(Vec::into_boxed_slice).collect(),
            outdegrees: outdegrees.into_boxed_slice(),
            dangling,
            num_arcs,
        })
    }
}

/// Appends arc origins to the predecessor lists of a contiguous chunk of
/// destinations starting at `offset`. Exits when the channel disconnects.
fn append_worker(chunk: &mut [Vec<usize>], offset: usize, arcs: Receiver<(usize, usize)>) {
    for (src, dst) in arcs {
        let list = &mut chunk[dst - offset];
        if list.capacity() == 0 {
            list.reserve(FIRST_TOUCH_CAPACITY);
        }
        list.push(src);
    }
}

/// Sorts and deduplicates each predecessor list of a chunk in place,
/// reporting the origin of every removed duplicate on the back channel.
fn dedup_worker(chunk: &mut [Vec<usize>], duplicates: Sender<usize>) {
    for list in chunk {
        if list.is_empty() {
            continue;
        }
        list.sort_unstable();
        let mut len = 1;
        for i in 1..list.len() {
            if list[i] != list[i - 1] {
                list[len] = list[i];
                len += 1;
            } else {
                duplicates.send(list[i]).unwrap();
            }
        }
        list.truncate(len);
        list.shrink_to_fit();
    }
}

/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The signal-driven progress reporter.
//!
//! A [`Reporter`] is a dedicated thread answering user signals while a
//! computation runs: on `SIGUSR1` it takes a snapshot of the shared
//! [`Monitor`] and prints to standard error either a note that the
//! computation has not started yet (the graph is still being parsed), a note
//! that it has completed, or the current iteration count together with the
//! currently top-ranked node. `SIGUSR2` terminates the reporter, and is
//! raised by [`shutdown`](Reporter::shutdown) if the user never sends it.
//!
//! Signal delivery is routed through [`signal_hook`], so no user code runs
//! in signal-handler context and the remaining threads need no masking.

use crate::rank::monitor::{Monitor, Status};
use anyhow::{anyhow, Context, Result};
use signal_hook::consts::signal::{SIGUSR1, SIGUSR2};
use signal_hook::iterator::{Handle, Signals};
use std::sync::Arc;
use std::thread::JoinHandle;

/// A handle to the reporter thread.
pub struct Reporter {
    handle: Handle,
    thread: JoinHandle<()>,
}

impl Reporter {
    /// Spawns the reporter thread, registering it for `SIGUSR1` and
    /// `SIGUSR2`.
    pub fn spawn(monitor: Arc<Monitor>) -> Result<Self> {
        let mut signals =
            Signals::new([SIGUSR1, SIGUSR2]).context("registering signal handlers")?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("reporter".into())
            .spawn(move || {
                for signal in signals.forever() {
                    if signal != SIGUSR1 {
                        break;
                    }
                    match monitor.status() {
                        Status::NotStarted => {
                            eprintln!("computation not yet started (parsing)")
                        }
                        Status::Completed => eprintln!("computation completed"),
                        Status::Running {
                            iteration,
                            node,
                            rank,
                        } => eprintln!(
                            "iteration {}: max node {} with rank {:.6}",
                            iteration, node, rank
                        ),
                    }
                }
            })
            .context("spawning the reporter thread")?;
        Ok(Self { handle, thread })
    }

    /// Terminates the reporter and waits for it to exit.
    pub fn shutdown(self) -> Result<()> {
        self.handle.close();
        self.thread
            .join()
            .map_err(|_| anyhow!("the reporter thread panicked"))
    }
}

/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::{ensure, Result};
use clap::Parser;
use dsi_progress_logger::progress_logger;
use mtxrank::graph::Graph;
use mtxrank::rank::pagerank::{preds, PageRank};
use mtxrank::rank::Monitor;
use mtxrank::reporter::Reporter;
use mtxrank::utils::math::top_k;
use predicates::prelude::PredicateBooleanExt;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "mtxrank",
    version,
    about = "Compute PageRank for a directed graph given as a Matrix Market arc list.",
    long_about = None
)]
struct Args {
    /// The input graph in Matrix Market coordinate format.
    infile: PathBuf,

    #[arg(short = 'k', long = "top", default_value_t = 3)]
    /// The number of top-ranked nodes to display.
    top: usize,

    #[arg(short = 'm', long = "max-iter", default_value_t = preds::MaxIter::DEFAULT_MAX_ITER)]
    /// The maximum number of iterations.
    max_iter: usize,

    #[arg(short = 'd', long = "damping", default_value_t = 0.9)]
    /// The damping factor (must be in the open interval (0 . . 1)).
    damping: f64,

    #[arg(short = 'e', long = "threshold", default_value_t = preds::L1Norm::DEFAULT_THRESHOLD)]
    /// Stop when the L1 distance between successive approximations drops
    /// below this value.
    threshold: f64,

    #[arg(short = 't', long = "threads", default_value_t = 3, value_parser = num_threads_parser)]
    /// The number of worker threads.
    threads: usize,

    #[arg(short = 's', long = "signal", default_value_t = false)]
    /// Enable the progress reporter: SIGUSR1 prints the current top-ranked
    /// node to standard error, SIGUSR2 shuts the reporter down.
    signal: bool,
}

/// Parses the number of threads from a string.
fn num_threads_parser(arg: &str) -> Result<usize> {
    let num_threads = arg.parse::<usize>()?;
    ensure!(num_threads > 0, "Number of threads must be greater than 0");
    Ok(num_threads)
}

fn main() {
    if let Err(err) = run() {
        // Errors carry their context chain on a single line.
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()?;

    let args = Args::parse();
    ensure!(
        args.damping > 0.0 && args.damping < 1.0,
        "The damping factor must be in (0 . . 1), got {}",
        args.damping
    );
    ensure!(args.top > 0, "The number of top nodes must be positive");
    ensure!(
        args.max_iter > 0,
        "The maximum number of iterations must be positive"
    );

    let monitor = Arc::new(Monitor::new());
    let reporter = if args.signal {
        Some(Reporter::spawn(Arc::clone(&monitor))?)
    } else {
        None
    };

    let mut pl = progress_logger![];
    let graph = Graph::from_mtx_with_logging(&args.infile, args.threads, &mut pl)?;

    println!("Number of nodes: {}", graph.num_nodes());
    println!("Number of dead-end nodes: {}", graph.num_dangling());
    println!("Number of valid arcs: {}", graph.num_arcs());

    let mut pr = PageRank::new(&graph);
    pr.damping(args.damping).num_threads(args.threads);
    pr.run_with_monitor(
        preds::L1Norm::try_from(args.threshold)?.or(preds::MaxIter::from(args.max_iter)),
        &monitor,
    );

    if pr.iterations() < args.max_iter {
        println!("Converged after {} iterations", pr.iterations());
    } else {
        println!("Did not converge after {} iterations", args.max_iter);
    }

    println!(
        "Sum of ranks: {:.6} (should be 1)",
        pr.rank().iter().sum::<f64>()
    );

    let k = args.top.min(graph.num_nodes());
    println!("Top {} nodes:", k);
    for (node, rank) in top_k(pr.rank(), k) {
        println!("\t{}\t{:.6}", node, rank);
    }

    if let Some(reporter) = reporter {
        reporter.shutdown()?;
    }
    Ok(())
}

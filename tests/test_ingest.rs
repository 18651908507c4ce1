/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use mtxrank::graph::Graph;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::io::Cursor;
use std::io::Write;

fn parse(input: &str, num_threads: usize) -> Result<Graph> {
    Graph::read_mtx(Cursor::new(input), num_threads)
}

/// Checks the structural invariants every ingested graph must satisfy.
fn check_invariants(g: &Graph) {
    let n = g.num_nodes();
    let mut total_in = 0;
    let mut total_out = 0;
    for node in 0..n {
        let preds = g.predecessors(node);
        assert!(
            preds.windows(2).all(|w| w[0] < w[1]),
            "predecessors of {node} are not strictly ascending"
        );
        assert!(!preds.contains(&node), "self-loop at {node}");
        assert!(preds.iter().all(|&p| p < n), "origin out of range");
        total_in += preds.len();
        total_out += g.outdegree(node);
    }
    assert_eq!(total_in, g.num_arcs());
    assert_eq!(total_out, g.num_arcs());
    let dangling: Vec<_> = (0..n).filter(|&node| g.outdegree(node) == 0).collect();
    assert_eq!(g.dangling(), dangling.as_slice());
    assert_eq!(g.num_dangling(), dangling.len());
    for &node in g.dangling() {
        assert!(g.is_dangling(node));
    }
}

#[test]
fn test_two_node_cycle() -> Result<()> {
    let g = parse("2 2 2\n1 2\n2 1\n", 2)?;
    assert_eq!(g.num_nodes(), 2);
    assert_eq!(g.num_arcs(), 2);
    assert_eq!(g.num_dangling(), 0);
    assert_eq!(g.predecessors(0), &[1]);
    assert_eq!(g.predecessors(1), &[0]);
    check_invariants(&g);
    Ok(())
}

#[test]
fn test_comments_are_skipped() -> Result<()> {
    let g = parse(
        "%%MatrixMarket matrix coordinate pattern general\n% made up by hand\n3 3 2\n1 2\n2 3\n",
        3,
    )?;
    assert_eq!(g.num_nodes(), 3);
    assert_eq!(g.num_arcs(), 2);
    assert_eq!(g.dangling(), &[2]);
    check_invariants(&g);
    Ok(())
}

#[test]
fn test_self_loops_and_duplicates_are_dropped() -> Result<()> {
    let g = parse("3 3 4\n1 1\n1 2\n1 2\n2 3\n", 2)?;
    assert_eq!(g.num_nodes(), 3);
    assert_eq!(g.num_arcs(), 2);
    assert_eq!(g.predecessors(0), &[] as &[usize]);
    assert_eq!(g.predecessors(1), &[0]);
    assert_eq!(g.predecessors(2), &[1]);
    assert_eq!(g.outdegree(0), 1);
    assert_eq!(g.outdegree(1), 1);
    assert_eq!(g.outdegree(2), 0);
    assert_eq!(g.dangling(), &[2]);
    check_invariants(&g);
    Ok(())
}

#[test]
fn test_out_of_range_arcs_are_dropped() -> Result<()> {
    let g = parse("3 3 5\n1 2\n0 2\n4 1\n2 -1\n2 3\n", 2)?;
    assert_eq!(g.num_arcs(), 2);
    assert_eq!(g.predecessors(1), &[0]);
    assert_eq!(g.predecessors(2), &[1]);
    check_invariants(&g);
    Ok(())
}

#[test]
fn test_malformed_arc_aborts_with_line_number() {
    // Three integers on an arc line are malformed.
    let err = parse("3 3 2\n1 2\n1 2 3\n", 2).unwrap_err();
    assert!(err.to_string().contains("line 3"), "got: {err}");

    // A single token is malformed, even after comments.
    let err = parse("% comment\n2 2 1\n1\n", 2).unwrap_err();
    assert!(err.to_string().contains("line 3"), "got: {err}");

    // An empty line is malformed.
    let err = parse("2 2 2\n1 2\n\n", 2).unwrap_err();
    assert!(err.to_string().contains("line 3"), "got: {err}");

    // Non-numerical tokens are malformed.
    let err = parse("2 2 1\none two\n", 2).unwrap_err();
    assert!(err.to_string().contains("line 2"), "got: {err}");
}

#[test]
fn test_invalid_headers() {
    assert!(parse("", 2).is_err());
    assert!(parse("% only comments\n", 2).is_err());
    assert!(parse("3 4 1\n1 2\n", 2).is_err());
    assert!(parse("a b c\n", 2).is_err());
    assert!(parse("3 3 1 7\n1 2\n", 2).is_err());
    assert!(parse("0 0 0\n", 2).is_err());
}

#[test]
fn test_no_arcs() -> Result<()> {
    let g = parse("3 3 0\n", 2)?;
    assert_eq!(g.num_nodes(), 3);
    assert_eq!(g.num_arcs(), 0);
    assert_eq!(g.dangling(), &[0, 1, 2]);
    check_invariants(&g);
    Ok(())
}

#[test]
fn test_parsing_is_idempotent() -> Result<()> {
    let input = "4 4 6\n1 2\n1 2\n2 3\n3 4\n4 1\n2 1\n";
    let g = parse(input, 3)?;
    assert_eq!(g, parse(input, 3)?);

    // Deduplicated input produces the same graph.
    let deduped = "4 4 5\n1 2\n2 3\n3 4\n4 1\n2 1\n";
    assert_eq!(g, parse(deduped, 3)?);

    let mut first = Vec::new();
    let mut second = Vec::new();
    g.write_canonical(&mut first)?;
    parse(input, 1)?.write_canonical(&mut second)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_canonical_round_trip() -> Result<()> {
    let g = parse("5 5 7\n1 2\n2 3\n3 1\n3 1\n4 5\n5 4\n1 5\n", 2)?;
    let mut buf = Vec::new();
    g.write_canonical(&mut buf)?;
    let reparsed = Graph::read_mtx(Cursor::new(buf), 2)?;
    assert_eq!(g, reparsed);
    Ok(())
}

#[test]
fn test_thread_count_does_not_matter() -> Result<()> {
    let input = "10 10 12\n1 2\n2 3\n3 4\n4 5\n5 6\n6 7\n7 8\n8 9\n9 10\n10 1\n1 2\n5 5\n";
    let reference = parse(input, 1)?;
    check_invariants(&reference);
    // 17 workers on 10 nodes exercises empty intervals.
    for num_threads in [2, 3, 5, 8, 17] {
        assert_eq!(reference, parse(input, num_threads)?);
    }
    Ok(())
}

#[test]
fn test_random_arcs_against_reference_model() -> Result<()> {
    const N: i64 = 50;
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let mut input = format!("{} {} {}\n", N, N, 2000);
    let mut model = BTreeSet::new();
    for _ in 0..2000 {
        // Out-of-range arcs included on purpose.
        let src = rng.random_range(-2..N + 3);
        let dst = rng.random_range(-2..N + 3);
        input.push_str(&format!("{} {}\n", src, dst));
        if src != dst && src >= 1 && dst >= 1 && src <= N && dst <= N {
            model.insert(((src - 1) as usize, (dst - 1) as usize));
        }
    }

    for num_threads in [1, 3, 8] {
        let g = parse(&input, num_threads)?;
        check_invariants(&g);
        assert_eq!(g.num_arcs(), model.len());
        for node in 0..N as usize {
            let expected: Vec<_> = model
                .iter()
                .filter(|&&(_, dst)| dst == node)
                .map(|&(src, _)| src)
                .collect();
            assert_eq!(g.predecessors(node), expected.as_slice());
            let outdegree = model.iter().filter(|&&(src, _)| src == node).count();
            assert_eq!(g.outdegree(node), outdegree);
        }
    }
    Ok(())
}

#[test]
fn test_from_mtx_file() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(b"3 3 2\n1 2\n2 3\n")?;
    let g = Graph::from_mtx(file.path(), 2)?;
    assert_eq!(g.num_arcs(), 2);
    check_invariants(&g);

    let err = Graph::from_mtx("no/such/file.mtx", 2).unwrap_err();
    assert!(format!("{:#}", err).contains("no/such/file.mtx"));
    Ok(())
}

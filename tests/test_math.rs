/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use mtxrank::utils::math::{argmax, top_k};

#[test]
fn test_argmax() {
    assert_eq!(argmax::<f64>(&[]), None);
    assert_eq!(argmax(&[3]), Some(0));
    assert_eq!(argmax(&[1, 2, 5, 2, 1, 5]), Some(2));
    assert_eq!(argmax(&[0.1, 0.4, 0.2, 0.3]), Some(1));
}

#[test]
fn test_top_k() {
    let ranks = vec![0.1, 0.4, 0.2, 0.3];
    assert_eq!(top_k(&ranks, 0), vec![]);
    assert_eq!(top_k(&ranks, 1), vec![(1, 0.4)]);
    assert_eq!(
        top_k(&ranks, 4),
        vec![(1, 0.4), (3, 0.3), (2, 0.2), (0, 0.1)]
    );
    // k is clamped to the length.
    assert_eq!(top_k(&ranks, 10).len(), 4);
    // The input is left untouched.
    assert_eq!(ranks, vec![0.1, 0.4, 0.2, 0.3]);
}

#[test]
fn test_top_k_ties_break_to_earliest_index() {
    let ranks = vec![0.25, 0.5, 0.25, 0.5];
    assert_eq!(top_k(&ranks, 4), vec![(1, 0.5), (3, 0.5), (0, 0.25), (2, 0.25)]);
}

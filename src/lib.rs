/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

pub mod graph;
pub mod rank;
pub mod reporter;
pub mod utils;

pub mod prelude {
    pub use crate::graph::Graph;
    pub use crate::rank::monitor::{Monitor, Status};
    pub use crate::rank::pagerank::{preds, PageRank};
    pub use crate::reporter::Reporter;
    pub use crate::utils::math::{argmax, top_k};
}

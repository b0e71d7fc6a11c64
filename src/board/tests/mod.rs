//! Board module tests.
//!
//! - `make_unmake.rs` - Make/unmake correctness and the feature diffs of each move kind
//! - `movegen.rs` - Pseudo-legal move generation
//! - `proptest.rs` - Property-based tests over random move sequences

mod proptest;

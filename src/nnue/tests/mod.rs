//! NNUE tests that span several modules.
//!
//! - `util.rs` - Shared seeded test networks and move helpers
//! - `equivalence.rs` - Incremental updates against full refreshes, per move kind
//! - `proptest.rs` - Property-based tests over random move sequences

pub(crate) mod util;

//! Input features and per-move feature diffs.
//!
//! A feature is one "piece on square" fact seen from one perspective. The
//! encoding is relative to that perspective's king: the board is flipped
//! vertically for Black and mirrored horizontally whenever the king stands
//! on files a-d, so the king always appears on the e-h half. The king's
//! (oriented) rank then picks one of `KING_BUCKETS` weight sets.

use super::{INPUT_SIZE, KING_BUCKETS};
use crate::board::{Color, Piece, Square};

/// Bucket for each rank of the oriented king square.
const BUCKET_BY_RANK: [usize; 8] = [0, 1, 2, 2, 3, 3, 3, 3];

const _: () = assert!(BUCKET_BY_RANK[7] + 1 == KING_BUCKETS);

/// Maximum removals or additions a single move produces for one perspective.
pub const MAX_UPDATE_FEATURES: usize = 2;

/// XOR mask that orients squares for `perspective` given its king square.
#[inline]
const fn orientation(king_sq: Square, perspective: Color) -> usize {
    let flip = match perspective {
        Color::White => 0,
        Color::Black => 56,
    };
    let mirror = if king_sq.file() < 4 { 7 } else { 0 };
    flip ^ mirror
}

/// King bucket of `king_sq` seen from `perspective`.
#[inline]
#[must_use]
pub const fn king_bucket(king_sq: Square, perspective: Color) -> usize {
    let oriented = king_sq.index() ^ orientation(king_sq, perspective);
    BUCKET_BY_RANK[oriented / 8]
}

/// Feature index of `piece` of `color` on `sq`, seen from `perspective`
/// whose king stands on `king_sq`.
#[inline]
#[must_use]
pub const fn feature_index(
    piece: Piece,
    color: Color,
    sq: Square,
    king_sq: Square,
    perspective: Color,
) -> usize {
    let relative_kind = if color.index() == perspective.index() {
        piece.index()
    } else {
        6 + piece.index()
    };
    let oriented_sq = sq.index() ^ orientation(king_sq, perspective);
    (king_bucket(king_sq, perspective) * 12 + relative_kind) * 64 + oriented_sq
}

/// True when moving the king of `perspective` from `from` to `to` changes
/// every feature of that perspective (bucket or mirror half differs).
#[inline]
#[must_use]
pub const fn needs_refresh(from: Square, to: Square, perspective: Color) -> bool {
    (from.file() < 4) != (to.file() < 4)
        || king_bucket(from, perspective) != king_bucket(to, perspective)
}

/// Fixed-capacity list of feature indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeatureList {
    items: [u16; MAX_UPDATE_FEATURES],
    len: u8,
}

impl FeatureList {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        FeatureList {
            items: [0; MAX_UPDATE_FEATURES],
            len: 0,
        }
    }

    /// Append a feature.
    ///
    /// # Panics
    /// Panics if the list already holds `MAX_UPDATE_FEATURES` entries or the
    /// index is outside the input layer.
    #[inline]
    pub fn push(&mut self, feature: usize) {
        assert!(
            (self.len as usize) < MAX_UPDATE_FEATURES,
            "FeatureList overflow (capacity {MAX_UPDATE_FEATURES})"
        );
        assert!(feature < INPUT_SIZE, "feature {feature} out of range");
        self.items[self.len as usize] = feature as u16;
        self.len += 1;
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Features in insertion order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.items[..self.len as usize].iter().map(|&f| f as usize)
    }
}

/// Feature diff of one move for one perspective.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NnUpdate {
    pub removals: FeatureList,
    pub additions: FeatureList,
}

impl NnUpdate {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        NnUpdate {
            removals: FeatureList::new(),
            additions: FeatureList::new(),
        }
    }

    #[inline]
    pub fn remove(&mut self, feature: usize) {
        self.removals.push(feature);
    }

    #[inline]
    pub fn add(&mut self, feature: usize) {
        self.additions.push(feature);
    }

    /// An update without removals leaves the accumulator untouched.
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.removals.is_empty()
    }
}

/// What one perspective's accumulator needs after a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccumulatorChange {
    /// Derive from the previous ply with this diff.
    Delta(NnUpdate),
    /// Every feature moved (own king changed bucket or mirror half).
    Refresh,
}

impl AccumulatorChange {
    /// The diff, if this change is incremental
    #[must_use]
    pub fn delta(&self) -> Option<&NnUpdate> {
        match self {
            AccumulatorChange::Delta(update) => Some(update),
            AccumulatorChange::Refresh => None,
        }
    }
}

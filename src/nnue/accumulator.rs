//! Hidden layer accumulators and their ply-indexed history.
//!
//! Invariant kept by every operation here: the accumulator of a perspective
//! equals `feature_bias + sum(feature_row(f))` over the features active on
//! the board from that perspective. Lane arithmetic wraps, which keeps the
//! sum associative so refresh and any chain of updates agree exactly.

use super::features::{feature_index, AccumulatorChange, NnUpdate};
use super::network::Network;
use super::simd::Kernel;
use super::HIDDEN_SIZE;
use crate::board::{Color, Position, MAX_PLY};

/// Hidden layer pre-activations for one perspective.
#[derive(Clone, PartialEq, Eq)]
#[repr(C, align(64))]
pub struct Accumulator {
    vals: [i16; HIDDEN_SIZE],
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator {
            vals: [0; HIDDEN_SIZE],
        }
    }
}

impl std::fmt::Debug for Accumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accumulator")
            .field("head", &&self.vals[..8])
            .finish_non_exhaustive()
    }
}

#[inline]
fn add_row(acc: &mut [i16; HIDDEN_SIZE], row: &[i16; HIDDEN_SIZE]) {
    for (a, &w) in acc.iter_mut().zip(row) {
        *a = a.wrapping_add(w);
    }
}

#[inline]
fn sub_row(acc: &mut [i16; HIDDEN_SIZE], row: &[i16; HIDDEN_SIZE]) {
    for (a, &w) in acc.iter_mut().zip(row) {
        *a = a.wrapping_sub(w);
    }
}

impl Accumulator {
    /// Accumulator holding only the biases (empty board)
    #[must_use]
    pub fn from_bias(network: &Network) -> Self {
        Accumulator {
            vals: *network.feature_bias(),
        }
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> &[i16; HIDDEN_SIZE] {
        &self.vals
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [i16; HIDDEN_SIZE] {
        &mut self.vals
    }

    /// Recompute from scratch for `perspective`: biases plus the row of every
    /// occupied square's feature.
    pub fn refresh(&mut self, network: &Network, position: &Position, perspective: Color) {
        self.vals = *network.feature_bias();
        let king_sq = position.king_square(perspective);
        for (sq, color, piece) in position.occupied() {
            let feature = feature_index(piece, color, sq, king_sq, perspective);
            add_row(&mut self.vals, network.feature_row(feature));
        }
    }

    /// Fresh accumulator for `perspective` of `position`
    #[must_use]
    pub fn refreshed(network: &Network, position: &Position, perspective: Color) -> Self {
        let mut acc = Accumulator::default();
        acc.refresh(network, position, perspective);
        acc
    }

    /// Derive this ply's accumulator from the previous ply's and one diff.
    ///
    /// Without removals the move changed nothing for this perspective and the
    /// previous values are copied as-is.
    pub fn apply_update(&mut self, previous: &Accumulator, update: &NnUpdate, network: &Network) {
        self.vals = previous.vals;
        if update.is_noop() {
            return;
        }
        for feature in update.removals.iter() {
            sub_row(&mut self.vals, network.feature_row(feature));
        }
        for feature in update.additions.iter() {
            add_row(&mut self.vals, network.feature_row(feature));
        }
    }

    /// Add one feature's row in place
    #[inline]
    pub fn add_feature(&mut self, feature: usize, network: &Network) {
        add_row(&mut self.vals, network.feature_row(feature));
    }
}

/// Accumulators of both perspectives at one ply, indexed by `Color::index`
pub type AccumulatorPair = [Accumulator; 2];

/// Ply-indexed accumulator history for one search thread.
///
/// Storage for `MAX_PLY + 1` plies is allocated up front; `push` and `pop`
/// never allocate. Popping is O(1): the previous ply's accumulators are
/// still in place.
pub struct AccumulatorStack {
    plies: Vec<AccumulatorPair>,
    ply: usize,
}

impl AccumulatorStack {
    #[must_use]
    pub fn new() -> Self {
        AccumulatorStack {
            plies: vec![[Accumulator::default(), Accumulator::default()]; MAX_PLY + 1],
            ply: 0,
        }
    }

    /// Current ply (0 after `reset`)
    #[inline]
    #[must_use]
    pub fn ply(&self) -> usize {
        self.ply
    }

    /// Drop all history and refresh both perspectives at ply 0.
    pub fn reset(&mut self, network: &Network, position: &Position) {
        self.ply = 0;
        for color in Color::BOTH {
            self.plies[0][color.index()].refresh(network, position, color);
        }
    }

    /// Build the next ply from the current one.
    ///
    /// `position` must already be the post-move board; it is only read for
    /// perspectives that need a refresh.
    ///
    /// # Panics
    /// Panics when pushing past `MAX_PLY`.
    pub fn push(
        &mut self,
        network: &Network,
        position: &Position,
        changes: &[AccumulatorChange; 2],
    ) {
        assert!(self.ply < MAX_PLY, "accumulator stack overflow at ply {}", self.ply);
        let (done, rest) = self.plies.split_at_mut(self.ply + 1);
        let previous = &done[self.ply];
        let next = &mut rest[0];
        for color in Color::BOTH {
            let idx = color.index();
            match &changes[idx] {
                AccumulatorChange::Delta(update) => {
                    next[idx].apply_update(&previous[idx], update, network);
                }
                AccumulatorChange::Refresh => next[idx].refresh(network, position, color),
            }
        }
        self.ply += 1;
    }

    /// Return to the previous ply.
    ///
    /// # Panics
    /// Panics at ply 0.
    #[inline]
    pub fn pop(&mut self) {
        assert!(self.ply > 0, "accumulator stack underflow");
        self.ply -= 1;
    }

    /// Accumulator of `perspective` at the current ply
    #[inline]
    #[must_use]
    pub fn current(&self, perspective: Color) -> &Accumulator {
        &self.plies[self.ply][perspective.index()]
    }

    /// Score of the current ply from `side_to_move`'s point of view
    #[inline]
    #[must_use]
    pub fn evaluate(&self, network: &Network, side_to_move: Color, kernel: Kernel) -> i32 {
        let pair = &self.plies[self.ply];
        network.output(
            &pair[side_to_move.index()],
            &pair[side_to_move.opponent().index()],
            kernel,
        )
    }
}

impl Default for AccumulatorStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Piece, Square};
    use crate::nnue::tests::util::test_network;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_refresh_of_bare_kings() {
        let net = test_network();
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1");
        let acc = Accumulator::refreshed(net, &pos, Color::White);

        let mut expected = Accumulator::from_bias(net);
        let wk = feature_index(Piece::King, Color::White, sq("e1"), sq("e1"), Color::White);
        let bk = feature_index(Piece::King, Color::Black, sq("e8"), sq("e1"), Color::White);
        expected.add_feature(bk, net);
        expected.add_feature(wk, net);
        assert_eq!(acc, expected);
    }

    #[test]
    fn test_noop_update_copies_previous() {
        let net = test_network();
        let previous = Accumulator::refreshed(net, &Position::startpos(), Color::Black);
        let mut update = NnUpdate::new();
        // An addition without removals is still the no-op path
        update.add(feature_index(Piece::Queen, Color::White, sq("d4"), sq("e8"), Color::Black));
        let mut next = Accumulator::default();
        next.apply_update(&previous, &update, net);
        assert_eq!(next, previous);
    }

    #[test]
    fn test_update_then_inverse_restores() {
        let net = test_network();
        let start = Accumulator::refreshed(net, &Position::startpos(), Color::White);
        let knight_b1 = feature_index(Piece::Knight, Color::White, sq("b1"), sq("e1"), Color::White);
        let knight_c3 = feature_index(Piece::Knight, Color::White, sq("c3"), sq("e1"), Color::White);

        let mut forward = NnUpdate::new();
        forward.remove(knight_b1);
        forward.add(knight_c3);
        let mut moved = Accumulator::default();
        moved.apply_update(&start, &forward, net);
        assert_ne!(moved, start);

        let mut back = NnUpdate::new();
        back.remove(knight_c3);
        back.add(knight_b1);
        let mut restored = Accumulator::default();
        restored.apply_update(&moved, &back, net);
        assert_eq!(restored, start);
    }

    #[test]
    fn test_lane_arithmetic_wraps() {
        let mut acc = [i16::MAX; HIDDEN_SIZE];
        add_row(&mut acc, &[1; HIDDEN_SIZE]);
        assert!(acc.iter().all(|&v| v == i16::MIN));
        sub_row(&mut acc, &[1; HIDDEN_SIZE]);
        assert!(acc.iter().all(|&v| v == i16::MAX));
    }

    #[test]
    fn test_stack_push_pop() {
        let net = test_network();
        let mut pos = Position::startpos();
        let mut stack = AccumulatorStack::new();
        stack.reset(net, &pos);
        let root_white = stack.current(Color::White).clone();
        let root_black = stack.current(Color::Black).clone();

        let mv = crate::board::Move::double_pawn_push(sq("e2"), sq("e4"));
        let (_, changes) = pos.make_move(mv);
        stack.push(net, &pos, &changes);
        assert_eq!(stack.ply(), 1);
        assert_ne!(stack.current(Color::White), &root_white);

        stack.pop();
        assert_eq!(stack.ply(), 0);
        assert_eq!(stack.current(Color::White), &root_white);
        assert_eq!(stack.current(Color::Black), &root_black);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn test_stack_underflow_panics() {
        AccumulatorStack::new().pop();
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn test_stack_overflow_panics() {
        let net = test_network();
        let pos = Position::startpos();
        let mut stack = AccumulatorStack::new();
        stack.reset(net, &pos);
        let noop = [
            AccumulatorChange::Delta(NnUpdate::new()),
            AccumulatorChange::Delta(NnUpdate::new()),
        ];
        for _ in 0..=MAX_PLY {
            stack.push(net, &pos, &noop);
        }
    }
}

//! Position evaluation: one-shot prediction and the incremental driver used
//! along a search path.

use std::sync::Arc;

use log::debug;

use super::accumulator::{Accumulator, AccumulatorStack};
use super::network::Network;
use super::simd::Kernel;
use crate::board::{Move, NullMoveInfo, Position, UnmakeInfo};

/// Magnitude bound for evaluations of a well-trained network; search treats
/// anything at or beyond it as a decisive score.
pub const MAX_EVAL: i32 = 30_000;

/// Evaluate `position` from scratch with the detected kernel.
///
/// Positive scores favor the side to move.
#[must_use]
pub fn predict(network: &Network, position: &Position) -> i32 {
    predict_with_kernel(network, position, Kernel::detect())
}

/// Evaluate `position` from scratch with a specific kernel.
#[must_use]
pub fn predict_with_kernel(network: &Network, position: &Position, kernel: Kernel) -> i32 {
    let stm = position.side_to_move();
    let own = Accumulator::refreshed(network, position, stm);
    let opp = Accumulator::refreshed(network, position, stm.opponent());
    network.output(&own, &opp, kernel.or_scalar())
}

/// Per-worker evaluation state.
///
/// Owns a handle to the shared network and this worker's accumulator
/// history. Moves must go through the evaluator so the history follows the
/// position ply by ply.
pub struct Evaluator {
    network: Arc<Network>,
    kernel: Kernel,
    stack: AccumulatorStack,
}

impl Evaluator {
    /// Evaluator using the widest kernel the host supports.
    #[must_use]
    pub fn new(network: Arc<Network>) -> Self {
        Self::with_kernel(network, Kernel::detect())
    }

    /// Evaluator forced to `kernel`; falls back to scalar if the host
    /// cannot run it.
    #[must_use]
    pub fn with_kernel(network: Arc<Network>, kernel: Kernel) -> Self {
        let selected = kernel.or_scalar();
        if selected != kernel {
            debug!("kernel {kernel} unavailable, using {selected}");
        }
        Evaluator {
            network,
            kernel: selected,
            stack: AccumulatorStack::new(),
        }
    }

    /// Start a new search root: drop history and refresh from `position`.
    pub fn set_position(&mut self, position: &Position) {
        self.stack.reset(&self.network, position);
    }

    /// Play `mv` on `position` and derive the next ply's accumulators.
    ///
    /// # Panics
    /// Panics past `MAX_PLY` plies from the root.
    pub fn make_move(&mut self, position: &mut Position, mv: Move) -> UnmakeInfo {
        let (info, changes) = position.make_move(mv);
        self.stack.push(&self.network, position, &changes);
        info
    }

    /// Take back `mv`; the previous ply's accumulators are still in place.
    pub fn unmake_move(&mut self, position: &mut Position, mv: Move, info: UnmakeInfo) {
        position.unmake_move(mv, info);
        self.stack.pop();
    }

    pub fn make_null_move(&mut self, position: &mut Position) -> NullMoveInfo {
        let (info, changes) = position.make_null_move();
        self.stack.push(&self.network, position, &changes);
        info
    }

    pub fn unmake_null_move(&mut self, position: &mut Position, info: NullMoveInfo) {
        position.unmake_null_move(info);
        self.stack.pop();
    }

    /// Score of `position` from the current ply's accumulators.
    ///
    /// `position` must be the board this evaluator has followed since the
    /// last `set_position`.
    #[inline]
    #[must_use]
    pub fn evaluate(&self, position: &Position) -> i32 {
        self.stack
            .evaluate(&self.network, position.side_to_move(), self.kernel)
    }

    /// Score of `position` recomputed from scratch, bypassing the history.
    #[must_use]
    pub fn refresh_evaluate(&self, position: &Position) -> i32 {
        predict_with_kernel(&self.network, position, self.kernel)
    }

    /// Plies played since the last `set_position`
    #[inline]
    #[must_use]
    pub fn ply(&self) -> usize {
        self.stack.ply()
    }

    #[inline]
    #[must_use]
    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    #[must_use]
    pub fn network(&self) -> &Arc<Network> {
        &self.network
    }

    #[must_use]
    pub fn network_hash(&self) -> u64 {
        self.network.hash()
    }

    /// Current-ply accumulators, own (side to move) first
    #[must_use]
    pub fn accumulators(&self, position: &Position) -> (&Accumulator, &Accumulator) {
        let stm = position.side_to_move();
        (self.stack.current(stm), self.stack.current(stm.opponent()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;
    use crate::nnue::tests::util::{shared_test_network, test_network};

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_predict_is_deterministic() {
        let net = test_network();
        let pos = Position::startpos();
        let first = predict(net, &pos);
        for kernel in Kernel::ALL {
            assert_eq!(predict_with_kernel(net, &pos, kernel), first);
        }
    }

    #[test]
    fn test_evaluator_follows_moves() {
        let mut pos = Position::startpos();
        let mut eval = Evaluator::new(shared_test_network());
        eval.set_position(&pos);
        assert_eq!(eval.evaluate(&pos), eval.refresh_evaluate(&pos));

        let mv = Move::double_pawn_push(sq("e2"), sq("e4"));
        let info = eval.make_move(&mut pos, mv);
        assert_eq!(eval.ply(), 1);
        assert_eq!(eval.evaluate(&pos), eval.refresh_evaluate(&pos));

        eval.unmake_move(&mut pos, mv, info);
        assert_eq!(eval.ply(), 0);
        assert_eq!(pos, Position::startpos());
        assert_eq!(eval.evaluate(&pos), predict(test_network(), &pos));
    }

    #[test]
    fn test_null_move_swaps_perspective() {
        let mut pos = Position::from_fen("4k3/8/8/3q4/8/8/8/4K3 w - - 0 1");
        let mut eval = Evaluator::with_kernel(shared_test_network(), Kernel::Scalar);
        eval.set_position(&pos);
        let (own_before, opp_before) = eval.accumulators(&pos);
        let (own_before, opp_before) = (own_before.clone(), opp_before.clone());

        let info = eval.make_null_move(&mut pos);
        let (own_after, opp_after) = eval.accumulators(&pos);
        assert_eq!(own_after, &opp_before);
        assert_eq!(opp_after, &own_before);
        assert_eq!(eval.evaluate(&pos), eval.refresh_evaluate(&pos));

        eval.unmake_null_move(&mut pos, info);
        assert_eq!(eval.ply(), 0);
    }

    #[test]
    fn test_network_hash_exposed() {
        let eval = Evaluator::new(shared_test_network());
        assert_eq!(eval.network_hash(), test_network().hash());
        assert!(eval.kernel().is_supported());
    }
}

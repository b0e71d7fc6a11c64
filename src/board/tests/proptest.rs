//! Property-based tests using proptest.

use crate::board::{Move, Position, UnmakeInfo};
use crate::nnue::AccumulatorChange;
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn move_count_strategy() -> impl Strategy<Value = usize> {
    1..=40usize
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// make_move followed by unmake_move restores the position exactly
    #[test]
    fn prop_make_unmake_restores_state(seed in any::<u64>(), num_moves in move_count_strategy()) {
        let mut pos = Position::startpos();
        let mut rng = StdRng::seed_from_u64(seed);
        let initial_fen = pos.to_fen();

        let mut history: Vec<(Move, UnmakeInfo)> = Vec::new();
        for _ in 0..num_moves {
            let moves = pos.generate_moves();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            let (info, _) = pos.make_move(mv);
            history.push((mv, info));
        }

        while let Some((mv, info)) = history.pop() {
            pos.unmake_move(mv, info);
        }
        prop_assert_eq!(pos.to_fen(), initial_fen);
        prop_assert_eq!(pos, Position::startpos());
    }

    /// Every non-null move removes at least one feature from each
    /// perspective it updates incrementally
    #[test]
    fn prop_moves_always_remove_a_feature(seed in any::<u64>(), num_moves in move_count_strategy()) {
        let mut pos = Position::startpos();
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..num_moves {
            let moves = pos.generate_moves();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            let (_, changes) = pos.make_move(mv);
            for change in &changes {
                if let AccumulatorChange::Delta(update) = change {
                    prop_assert!(!update.removals.is_empty());
                    prop_assert!(!update.additions.is_empty());
                    prop_assert!(!update.is_noop());
                }
            }
        }
    }

    /// Both kings stay on the board and are tracked correctly
    #[test]
    fn prop_king_squares_tracked(seed in any::<u64>(), num_moves in move_count_strategy()) {
        let mut pos = Position::startpos();
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..num_moves {
            let moves = pos.generate_moves();
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.gen_range(0..moves.len())];
            pos.make_move(mv);
            for color in crate::board::Color::BOTH {
                prop_assert_eq!(
                    pos.piece_at(pos.king_square(color)),
                    Some((color, crate::board::Piece::King))
                );
            }
        }
    }
}

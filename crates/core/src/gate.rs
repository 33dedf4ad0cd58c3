//! Round advancement predicates.
//!
//! Nothing here is cached: callers ask again at every decision point so the
//! answer always reflects the current `chosen` flags.

use crate::models::{Board, Category, RoundName};

/// Whether every clue in the given categories has been chosen.
pub fn round_exhausted(categories: &[Category]) -> bool {
    categories
        .iter()
        .all(|category| category.clues.iter().all(|clue| clue.chosen))
}

/// Whether play may leave `round`.
///
/// Only board rounds advance this way, and only once their board is used up.
/// A missing board never advances.
pub fn can_advance(round: RoundName, board: &Board) -> bool {
    if !round.is_board_round() {
        return false;
    }
    board.round(round).map(round_exhausted).unwrap_or(false)
}

/// Round that follows `round` when advancing from the board.
///
/// Games without a double board go straight from single to final.
pub fn target_round(round: RoundName, has_double: bool) -> Option<RoundName> {
    match round {
        RoundName::Single if has_double => Some(RoundName::Double),
        RoundName::Single | RoundName::Double => Some(RoundName::Final),
        RoundName::Final | RoundName::Done => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Clue, FinalClue};

    fn board(columns: usize, rows: usize, with_double: bool) -> Board {
        let round = |prefix: &str| -> Vec<Category> {
            (0..columns)
                .map(|c| Category {
                    category: format!("{prefix} {c}"),
                    clues: (0..rows)
                        .map(|r| Clue::new(format!("clue {c}/{r}"), 200 * (r as u32 + 1)))
                        .collect(),
                })
                .collect()
        };
        Board {
            single: round("Single"),
            double: with_double.then(|| round("Double")),
            final_clue: FinalClue {
                category: "Final".to_string(),
                clue: "clue".to_string(),
                solution: "solution".to_string(),
                html: false,
            },
        }
    }

    fn choose(board: &mut Board, round: RoundName, category: usize, clue: usize) {
        board.round_mut(round).expect("round")[category].clues[clue].chosen = true;
    }

    #[test]
    fn opens_only_after_last_clue_in_any_order() {
        let orders = [
            vec![(0, 0), (0, 1), (1, 0), (1, 1)],
            vec![(1, 1), (0, 0), (1, 0), (0, 1)],
            vec![(1, 0), (1, 1), (0, 1), (0, 0)],
        ];
        for order in orders {
            let mut board = board(2, 2, true);
            for (step, (category, clue)) in order.iter().enumerate() {
                assert!(!can_advance(RoundName::Single, &board), "step {step}");
                choose(&mut board, RoundName::Single, *category, *clue);
            }
            assert!(can_advance(RoundName::Single, &board));
            assert!(!can_advance(RoundName::Double, &board));
        }
    }

    #[test]
    fn final_and_done_never_advance() {
        let board = board(1, 1, false);
        assert!(!can_advance(RoundName::Final, &board));
        assert!(!can_advance(RoundName::Done, &board));
    }

    #[test]
    fn missing_double_board_never_advances() {
        let board = board(1, 1, false);
        assert!(!can_advance(RoundName::Double, &board));
    }

    #[test]
    fn single_skips_to_final_without_double() {
        assert_eq!(
            target_round(RoundName::Single, true),
            Some(RoundName::Double)
        );
        assert_eq!(
            target_round(RoundName::Single, false),
            Some(RoundName::Final)
        );
        assert_eq!(
            target_round(RoundName::Double, false),
            Some(RoundName::Final)
        );
        assert_eq!(target_round(RoundName::Final, true), None);
    }
}

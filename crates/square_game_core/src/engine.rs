//! Match engine: card selection and pair resolution.
//!
//! The engine owns the cards of one round and moves through three selection
//! states:
//! - `AwaitingFirst` - no card is pending
//! - `AwaitingSecond` - one card is face up waiting for its partner
//! - `Resolving` - a mismatched pair is face up until its flip-back settles
//!
//! Taps that are not valid in the current state are ignored, never errors.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::grid::CardShuffler;
use crate::types::{Card, CardId, GameMode, GameStats};

/// Selection state within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selection {
    /// No card pending.
    #[default]
    AwaitingFirst,
    /// One card is face up.
    AwaitingSecond {
        /// Grid index of the pending card.
        first: usize,
    },
    /// A mismatched pair waits to be flipped back.
    Resolving {
        /// Identity of the first card of the pair.
        first: CardId,
        /// Identity of the second card of the pair.
        second: CardId,
    },
}

/// Why a tap had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum IgnoreReason {
    /// The session is not in the playing phase.
    #[display("not playing")]
    NotPlaying,
    /// A mismatched pair is still face up.
    #[display("resolving a mismatch")]
    Resolving,
    /// Index past the end of the grid.
    #[display("index out of range")]
    OutOfRange,
    /// Card is already face up.
    #[display("card already flipped")]
    AlreadyFlipped,
    /// Card is already paired.
    #[display("card already matched")]
    AlreadyMatched,
    /// The pre-solved center card.
    #[display("bonus card")]
    BonusCard,
}

/// Result of a tap on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Nothing changed.
    Ignored(IgnoreReason),
    /// The card became the pending first pick.
    FirstPick {
        /// Grid index of the flipped card.
        index: usize,
    },
    /// The two cards share a color and are now matched.
    Matched {
        /// Grid index of the first card.
        first: usize,
        /// Grid index of the second card.
        second: usize,
        /// Whether the remaining colors were reshuffled (Difficult mode).
        reshuffled: bool,
    },
    /// The two cards differ; they stay face up until the flip-back.
    Mismatched {
        /// Identity of the first card.
        first: CardId,
        /// Identity of the second card.
        second: CardId,
    },
}

/// Card state machine for one round.
#[derive(Debug, Clone, Default)]
pub struct MatchEngine {
    cards: Vec<Card>,
    pair_count: u32,
    selection: Selection,
}

impl MatchEngine {
    /// Creates an engine over a freshly dealt grid.
    pub fn new(cards: Vec<Card>, pair_count: u32) -> Self {
        Self {
            cards,
            pair_count,
            selection: Selection::AwaitingFirst,
        }
    }

    /// The cards in grid order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Pairs on the grid.
    pub fn pair_count(&self) -> u32 {
        self.pair_count
    }

    /// Current selection state.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// True while a mismatched pair waits for its flip-back.
    pub fn is_resolving(&self) -> bool {
        matches!(self.selection, Selection::Resolving { .. })
    }

    /// Flips every non-bonus, unmatched card face up or face down.
    #[instrument(skip(self))]
    pub fn reveal_all(&mut self, face_up: bool) {
        for card in self.cards.iter_mut().filter(|c| !c.is_bonus && !c.is_matched) {
            card.is_flipped = face_up;
        }
    }

    /// Handles a tap on the card at `index`.
    ///
    /// The second valid tap of a turn increments `turns`; a match increments
    /// `matches_found` and, in Difficult mode, reshuffles the colors of the
    /// remaining unmatched cards and increments `color_shuffles`.
    #[instrument(skip(self, stats, shuffler), fields(selection = ?self.selection))]
    pub fn select<S: CardShuffler>(
        &mut self,
        index: usize,
        mode: GameMode,
        stats: &mut GameStats,
        shuffler: &mut S,
    ) -> TapOutcome {
        if self.is_resolving() {
            return TapOutcome::Ignored(IgnoreReason::Resolving);
        }
        let Some(card) = self.cards.get(index) else {
            return TapOutcome::Ignored(IgnoreReason::OutOfRange);
        };
        if card.is_bonus {
            return TapOutcome::Ignored(IgnoreReason::BonusCard);
        }
        if card.is_matched {
            return TapOutcome::Ignored(IgnoreReason::AlreadyMatched);
        }
        if card.is_flipped {
            return TapOutcome::Ignored(IgnoreReason::AlreadyFlipped);
        }

        self.cards[index].is_flipped = true;

        let first = match self.selection {
            Selection::AwaitingFirst => {
                self.selection = Selection::AwaitingSecond { first: index };
                return TapOutcome::FirstPick { index };
            }
            Selection::AwaitingSecond { first } => first,
            Selection::Resolving { .. } => return TapOutcome::Ignored(IgnoreReason::Resolving),
        };

        stats.turns += 1;

        if self.cards[first].color_index == self.cards[index].color_index {
            self.cards[first].is_matched = true;
            self.cards[index].is_matched = true;
            stats.matches_found += 1;
            self.selection = Selection::AwaitingFirst;

            let reshuffled = mode == GameMode::Difficult;
            if reshuffled {
                self.reshuffle_unmatched(shuffler);
                stats.color_shuffles += 1;
            }
            debug!(first, second = index, turns = stats.turns, "Pair matched");
            TapOutcome::Matched {
                first,
                second: index,
                reshuffled,
            }
        } else {
            let first_id = self.cards[first].id;
            let second_id = self.cards[index].id;
            self.selection = Selection::Resolving {
                first: first_id,
                second: second_id,
            };
            debug!(first, second = index, turns = stats.turns, "Pair mismatched");
            TapOutcome::Mismatched {
                first: first_id,
                second: second_id,
            }
        }
    }

    /// Flips a mismatched pair back face down.
    ///
    /// Cards are looked up by identity. Returns `false` and changes nothing
    /// when the pair is not the one currently resolving.
    #[instrument(skip(self))]
    pub fn settle_mismatch(&mut self, first: CardId, second: CardId) -> bool {
        if self.selection != (Selection::Resolving { first, second }) {
            debug!("Flip-back does not match the resolving pair");
            return false;
        }
        for card in self
            .cards
            .iter_mut()
            .filter(|c| (c.id == first || c.id == second) && !c.is_matched)
        {
            card.is_flipped = false;
        }
        self.selection = Selection::AwaitingFirst;
        true
    }

    /// Permutes the colors of all unmatched, non-bonus cards in place.
    ///
    /// Flags and identities stay with their positions; only colors move.
    fn reshuffle_unmatched<S: CardShuffler>(&mut self, shuffler: &mut S) {
        let positions: Vec<usize> = self
            .cards
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_matched && !c.is_bonus)
            .map(|(i, _)| i)
            .collect();
        let mut colors: Vec<i32> = positions.iter().map(|&i| self.cards[i].color_index).collect();
        shuffler.shuffle_slice(&mut colors);
        for (&position, color) in positions.iter().zip(colors) {
            self.cards[position].color_index = color;
        }
        debug!(remaining = positions.len(), "Reshuffled unmatched colors");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReverseShuffler;

    impl CardShuffler for ReverseShuffler {
        fn shuffle_slice<T>(&mut self, items: &mut [T]) {
            items.reverse();
        }
    }

    /// Layout `[0, 1, 0, 1]` so indices 0/2 and 1/3 pair up.
    fn engine() -> MatchEngine {
        let cards = vec![
            Card::new(CardId(0), 0),
            Card::new(CardId(1), 1),
            Card::new(CardId(2), 0),
            Card::new(CardId(3), 1),
        ];
        MatchEngine::new(cards, 2)
    }

    #[test]
    fn first_tap_flips_and_waits() {
        let mut engine = engine();
        let mut stats = GameStats::default();
        let outcome = engine.select(1, GameMode::Score, &mut stats, &mut ReverseShuffler);
        assert_eq!(outcome, TapOutcome::FirstPick { index: 1 });
        assert!(engine.cards()[1].is_flipped);
        assert_eq!(engine.selection(), Selection::AwaitingSecond { first: 1 });
        assert_eq!(stats.turns, 0);
    }

    #[test]
    fn matching_pair_is_marked() {
        let mut engine = engine();
        let mut stats = GameStats::default();
        engine.select(0, GameMode::Score, &mut stats, &mut ReverseShuffler);
        let outcome = engine.select(2, GameMode::Score, &mut stats, &mut ReverseShuffler);
        assert_eq!(
            outcome,
            TapOutcome::Matched {
                first: 0,
                second: 2,
                reshuffled: false
            }
        );
        assert!(engine.cards()[0].is_matched && engine.cards()[2].is_matched);
        assert_eq!(stats.turns, 1);
        assert_eq!(stats.matches_found, 1);
        assert_eq!(engine.selection(), Selection::AwaitingFirst);
    }

    #[test]
    fn mismatch_blocks_until_settled() {
        let mut engine = engine();
        let mut stats = GameStats::default();
        engine.select(0, GameMode::Score, &mut stats, &mut ReverseShuffler);
        let outcome = engine.select(1, GameMode::Score, &mut stats, &mut ReverseShuffler);
        assert_eq!(
            outcome,
            TapOutcome::Mismatched {
                first: CardId(0),
                second: CardId(1)
            }
        );
        assert_eq!(
            engine.select(3, GameMode::Score, &mut stats, &mut ReverseShuffler),
            TapOutcome::Ignored(IgnoreReason::Resolving)
        );

        assert!(!engine.settle_mismatch(CardId(1), CardId(0)));
        assert!(engine.settle_mismatch(CardId(0), CardId(1)));
        assert!(!engine.cards()[0].is_flipped && !engine.cards()[1].is_flipped);
        assert_eq!(engine.selection(), Selection::AwaitingFirst);
        assert_eq!(stats.turns, 1);
        assert!(!engine.settle_mismatch(CardId(0), CardId(1)));
    }

    #[test]
    fn invalid_taps_are_ignored() {
        let mut engine = engine();
        let mut stats = GameStats::default();
        assert_eq!(
            engine.select(9, GameMode::Score, &mut stats, &mut ReverseShuffler),
            TapOutcome::Ignored(IgnoreReason::OutOfRange)
        );
        engine.select(0, GameMode::Score, &mut stats, &mut ReverseShuffler);
        assert_eq!(
            engine.select(0, GameMode::Score, &mut stats, &mut ReverseShuffler),
            TapOutcome::Ignored(IgnoreReason::AlreadyFlipped)
        );
        engine.select(2, GameMode::Score, &mut stats, &mut ReverseShuffler);
        assert_eq!(
            engine.select(2, GameMode::Score, &mut stats, &mut ReverseShuffler),
            TapOutcome::Ignored(IgnoreReason::AlreadyMatched)
        );
        assert_eq!(stats.turns, 1);
    }

    #[test]
    fn bonus_card_cannot_be_picked() {
        let cards = vec![
            Card::new(CardId(0), 0),
            Card::bonus(CardId(1)),
            Card::new(CardId(2), 0),
        ];
        let mut engine = MatchEngine::new(cards, 1);
        let mut stats = GameStats::default();
        assert_eq!(
            engine.select(1, GameMode::Score, &mut stats, &mut ReverseShuffler),
            TapOutcome::Ignored(IgnoreReason::BonusCard)
        );
    }

    #[test]
    fn difficult_match_reshuffles_only_unmatched_colors() {
        let cards = vec![
            Card::new(CardId(0), 0),
            Card::new(CardId(1), 0),
            Card::new(CardId(2), 1),
            Card::new(CardId(3), 2),
            Card::new(CardId(4), 1),
            Card::new(CardId(5), 2),
        ];
        let mut engine = MatchEngine::new(cards, 3);
        let mut stats = GameStats::default();
        engine.select(0, GameMode::Difficult, &mut stats, &mut ReverseShuffler);
        let outcome = engine.select(1, GameMode::Difficult, &mut stats, &mut ReverseShuffler);
        assert!(matches!(outcome, TapOutcome::Matched { reshuffled: true, .. }));
        assert_eq!(stats.color_shuffles, 1);

        let colors: Vec<i32> = engine.cards().iter().map(|c| c.color_index).collect();
        assert_eq!(colors, [0, 0, 2, 1, 2, 1]);
        let ids: Vec<u32> = engine.cards().iter().map(|c| c.id.0).collect();
        assert_eq!(ids, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn reveal_all_skips_bonus_and_matched() {
        let mut cards = vec![
            Card::new(CardId(0), 0),
            Card::bonus(CardId(1)),
            Card::new(CardId(2), 0),
        ];
        cards[2].is_matched = true;
        cards[2].is_flipped = true;
        let mut engine = MatchEngine::new(cards, 1);
        engine.reveal_all(true);
        assert!(engine.cards()[0].is_flipped);
        engine.reveal_all(false);
        assert!(!engine.cards()[0].is_flipped);
        assert!(engine.cards()[1].is_flipped);
        assert!(engine.cards()[2].is_flipped);
    }
}

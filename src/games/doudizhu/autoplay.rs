use serde::{Deserialize, Serialize};

use super::cards::{Card, BIG_JOKER, RANK_TWO, SMALL_JOKER};
use super::enumerate::{all_valid_plays, beating_plays};
use super::pattern::{Pattern, PatternKind};
use crate::utils::value_counts;

/// Once the hand shrinks to this many cards, bombs and the rocket stop
/// being held back and jump to the front of the ordering.
const ENDGAME_HAND_SIZE: usize = 8;

/// Which way the main-rank tie-break leans when two candidate plays are
/// otherwise equal. `HighFirst` spends big ranks early; `LowFirst` keeps
/// them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TieBreak {
    #[default]
    HighFirst,
    LowFirst,
}

/// Pick a play for the hand, or `None` when the only move is to pass.
/// Candidates come from the enumerator; the winner is the first play
/// under a four-part ordering: bombs last (first in the endgame), fewest
/// distinct ranks left behind, the configured main-rank tie-break, then
/// the fixed kind priority.
pub fn select_play(hand: &[Card], last: Option<&Pattern>, tiebreak: TieBreak) -> Option<Pattern> {
    let mut candidates = match last {
        None => all_valid_plays(hand),
        Some(target) => beating_plays(hand, target),
    };
    if candidates.is_empty() {
        return None;
    }
    if let Some(winning) = candidates.iter().find(|p| p.cards.len() == hand.len()) {
        return Some(winning.clone());
    }
    let endgame = hand.len() <= ENDGAME_HAND_SIZE;
    candidates.sort_by_key(|play| {
        let explosive =
            play.kind == PatternKind::Bomb || play.kind == PatternKind::Rocket;
        let bomb_order = if explosive == endgame { 0 } else { 1 };
        let main_order = match tiebreak {
            TieBreak::HighFirst => -play.main_rank,
            TieBreak::LowFirst => play.main_rank,
        };
        (
            bomb_order,
            ranks_left_after(hand, play),
            main_order,
            play.kind.priority(),
        )
    });
    candidates.into_iter().next()
}

/// How many distinct ranks the hand would still hold after the play.
fn ranks_left_after(hand: &[Card], play: &Pattern) -> i32 {
    let mut counts = value_counts(hand.iter().map(|c| c.rank));
    for card in &play.cards {
        if let Some(n) = counts.get_mut(&card.rank) {
            *n -= 1;
            if *n == 0 {
                counts.remove(&card.rank);
            }
        }
    }
    counts.len() as i32
}

/// Bid for a hand that is playing on its own behalf. Counts the raw
/// muscle of the hand (bombs, jokers, twos) and maps it to a bid; a hand
/// with no muscle at all passes.
pub fn select_bid(hand: &[Card]) -> u8 {
    let counts = value_counts(hand.iter().map(|c| c.rank));
    let mut strength = 0;
    for (&rank, &n) in counts.iter() {
        if n == 4 && rank <= RANK_TWO {
            strength += 3;
        }
    }
    if counts.contains_key(&BIG_JOKER) {
        strength += 3;
    }
    if counts.contains_key(&SMALL_JOKER) {
        strength += 2;
    }
    strength += counts.get(&RANK_TWO).copied().unwrap_or(0);
    match strength {
        7.. => 3,
        4..=6 => 2,
        1..=3 => 1,
        _ => 0,
    }
}

use std::collections::HashSet;

use super::cards::{Card, BIG_JOKER, RANK_TWO, SMALL_JOKER};
use super::pattern::{classify, Pattern, PatternKind};
use crate::utils::value_counts;

/// Subsets longer than this are never considered. A hand tops out at 20
/// cards (17 dealt plus the 3 landlord cards) so nothing is lost; this is
/// a search bound, not a rules bound.
const MAX_SUBSET_LEN: usize = 20;

/// Sorted rank multiset, used to collapse plays that only differ by suit.
pub fn signature(cards: &[Card]) -> Vec<i32> {
    let mut ranks: Vec<i32> = cards.iter().map(|c| c.rank).collect();
    ranks.sort_unstable();
    ranks
}

/// Every distinct playable card set in the hand, as classified patterns.
/// Subsets are generated combinatorially; branches that would only repeat
/// an already-visited rank multiset are pruned at the choice point, so two
/// physical cards of the same rank never produce duplicate plays.
pub fn all_valid_plays(hand: &[Card]) -> Vec<Pattern> {
    let mut sorted: Vec<Card> = hand.to_vec();
    sorted.sort_by(|a, b| b.cmp(a));
    let mut plays = Vec::new();
    let mut seen: HashSet<Vec<i32>> = HashSet::new();
    let mut current: Vec<Card> = Vec::new();
    search(&sorted, 0, &mut current, &mut plays, &mut seen);
    plays
}

/// Depth-first subset walk over the sorted hand. Picking a later card of
/// the same rank at the same depth would only repeat a multiset, so those
/// branches are skipped and each rank combination comes up exactly once.
fn search(
    hand: &[Card],
    start: usize,
    current: &mut Vec<Card>,
    plays: &mut Vec<Pattern>,
    seen: &mut HashSet<Vec<i32>>,
) {
    if current.len() >= MAX_SUBSET_LEN {
        return;
    }
    for i in start..hand.len() {
        if i > start && hand[i].rank == hand[i - 1].rank {
            continue;
        }
        current.push(hand[i]);
        let pattern = classify(current);
        if pattern.kind != PatternKind::Invalid && seen.insert(signature(current)) {
            plays.push(pattern);
        }
        search(hand, i + 1, current, plays, seen);
        current.pop();
    }
}

/// Every play in the hand that beats `target`: the rocket whenever the
/// hand holds both jokers, every four-of-a-kind that outranks the target
/// under bomb rules, and all enumerated plays that beat it directly.
pub fn beating_plays(hand: &[Card], target: &Pattern) -> Vec<Pattern> {
    let mut plays: Vec<Pattern> = Vec::new();
    let mut seen: HashSet<Vec<i32>> = HashSet::new();

    if target.kind != PatternKind::Rocket {
        let jokers: Vec<Card> = hand
            .iter()
            .copied()
            .filter(|c| c.rank == SMALL_JOKER || c.rank == BIG_JOKER)
            .collect();
        if jokers.len() == 2 {
            let rocket = classify(&jokers);
            seen.insert(signature(&rocket.cards));
            plays.push(rocket);
        }
    }

    let counts = value_counts(hand.iter().map(|c| c.rank));
    for (&rank, &n) in counts.iter() {
        if n == 4 && rank <= RANK_TWO {
            let bomb_cards: Vec<Card> =
                hand.iter().copied().filter(|c| c.rank == rank).collect();
            let bomb = classify(&bomb_cards);
            if bomb.beats(Some(target)) && seen.insert(signature(&bomb.cards)) {
                plays.push(bomb);
            }
        }
    }

    for play in all_valid_plays(hand) {
        if play.beats(Some(target)) && seen.insert(signature(&play.cards)) {
            plays.push(play);
        }
    }
    plays
}

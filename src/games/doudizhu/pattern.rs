use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::cards::{Card, BIG_JOKER, RANK_TWO, SMALL_JOKER};
use crate::utils::{longest_consecutive_run, value_counts};

/// Sequences (straights, pair straights, airplanes) may not contain the
/// two or the jokers, so their top rank is capped at the ace.
const MAX_SEQUENCE_RANK: i32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    Single,
    Pair,
    Triple,
    TripleSingle,
    TriplePair,
    Straight,
    PairStraight,
    AirplaneStraight,
    FourWithTwoSingles,
    FourWithTwoPairs,
    Bomb,
    Rocket,
    Invalid,
}

impl PatternKind {
    /// Fixed ordering used as the final tie-break when the auto-play
    /// heuristic has no other reason to prefer one play over another.
    pub fn priority(&self) -> i32 {
        match self {
            PatternKind::Single => 1,
            PatternKind::Pair => 2,
            PatternKind::Triple => 3,
            PatternKind::TripleSingle => 4,
            PatternKind::TriplePair => 5,
            PatternKind::Straight => 6,
            PatternKind::PairStraight => 7,
            PatternKind::AirplaneStraight => 8,
            PatternKind::FourWithTwoSingles => 9,
            PatternKind::FourWithTwoPairs => 10,
            PatternKind::Bomb => 11,
            PatternKind::Rocket => 12,
            PatternKind::Invalid => 999,
        }
    }
}

/// A classified card set. `main_rank` is the comparison key (the repeated
/// or sequence-leading rank); `length` is the run length for the three
/// straight kinds and 0 for everything else. Derived data: recomputed from
/// the cards whenever it is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub main_rank: i32,
    pub length: i32,
    pub cards: Vec<Card>,
}

impl Pattern {
    fn new(kind: PatternKind, main_rank: i32, length: i32, cards: &[Card]) -> Self {
        Pattern {
            kind,
            main_rank,
            length,
            cards: cards.to_vec(),
        }
    }

    fn invalid(cards: &[Card]) -> Self {
        Pattern::new(PatternKind::Invalid, 0, 0, cards)
    }

    /// Whether this play beats `target`. An opening play (`target` =
    /// `None`) is always legal. The rocket beats everything and nothing
    /// beats it; a bomb beats any non-bomb; bombs compare by rank. The
    /// straight kinds additionally require equal run length, and the two
    /// four-with kinds only ever compare against their own kind. All
    /// other cross-kind comparisons lose.
    pub fn beats(&self, target: Option<&Pattern>) -> bool {
        if self.kind == PatternKind::Invalid {
            return false;
        }
        let other = match target {
            Some(other) => other,
            None => return true,
        };
        if other.kind == PatternKind::Invalid {
            return true;
        }
        if self.kind == PatternKind::Rocket {
            return true;
        }
        if other.kind == PatternKind::Rocket {
            return false;
        }
        match (self.kind == PatternKind::Bomb, other.kind == PatternKind::Bomb) {
            (true, false) => return true,
            (false, true) => return false,
            (true, true) => return self.main_rank > other.main_rank,
            (false, false) => {}
        }
        if self.kind != other.kind {
            return false;
        }
        match self.kind {
            PatternKind::Straight | PatternKind::PairStraight | PatternKind::AirplaneStraight => {
                self.length == other.length && self.main_rank > other.main_rank
            }
            _ => self.main_rank > other.main_rank,
        }
    }
}

/// Classify a card set. Checks run in a fixed order: rocket, bomb, the
/// single-rank shapes, triples with an attachment, fours with an
/// attachment, then the straight family; anything left over is invalid.
pub fn classify(cards: &[Card]) -> Pattern {
    if cards.is_empty() {
        return Pattern::invalid(cards);
    }
    if cards.iter().any(|c| c.rank < 3 || c.rank > BIG_JOKER) {
        return Pattern::invalid(cards);
    }
    let counts = value_counts(cards.iter().map(|c| c.rank));
    let size = cards.len() as i32;

    if is_rocket(&counts) {
        return Pattern::new(PatternKind::Rocket, BIG_JOKER, 0, cards);
    }
    if let Some((kind, main)) = single_rank_shape(&counts, size) {
        return Pattern::new(kind, main, 0, cards);
    }
    if let Some((kind, main)) = triple_with_attachment(&counts, size) {
        return Pattern::new(kind, main, 0, cards);
    }
    if let Some((kind, main)) = four_with_attachment(&counts, size) {
        return Pattern::new(kind, main, 0, cards);
    }
    if let Some((kind, main, length)) = straight_family(&counts, size) {
        return Pattern::new(kind, main, length, cards);
    }
    Pattern::invalid(cards)
}

fn is_rocket(counts: &BTreeMap<i32, i32>) -> bool {
    counts.len() == 2
        && counts.get(&SMALL_JOKER) == Some(&1)
        && counts.get(&BIG_JOKER) == Some(&1)
}

/// Bomb, single, pair and triple: everything made of one rank only.
/// A single may be a joker; pairs and triples may not.
fn single_rank_shape(counts: &BTreeMap<i32, i32>, size: i32) -> Option<(PatternKind, i32)> {
    if counts.len() != 1 {
        return None;
    }
    let (&rank, _) = counts.iter().next().expect("one entry was just checked");
    match size {
        1 => Some((PatternKind::Single, rank)),
        2 if rank <= RANK_TWO => Some((PatternKind::Pair, rank)),
        3 if rank <= RANK_TWO => Some((PatternKind::Triple, rank)),
        4 if rank <= RANK_TWO => Some((PatternKind::Bomb, rank)),
        _ => None,
    }
}

/// Triple with one single (size 4) or one pair (size 5) attached.
fn triple_with_attachment(counts: &BTreeMap<i32, i32>, size: i32) -> Option<(PatternKind, i32)> {
    let triples: Vec<i32> = counts
        .iter()
        .filter(|(_, &n)| n == 3)
        .map(|(&rank, _)| rank)
        .collect();
    if triples.len() != 1 {
        return None;
    }
    let main = triples[0];
    if main > RANK_TWO {
        return None;
    }
    let attached = |wanted: i32| {
        counts
            .iter()
            .filter(|(&rank, &n)| rank != main && n == wanted)
            .count()
    };
    if size == 4 && counts.len() == 2 && attached(1) == 1 {
        return Some((PatternKind::TripleSingle, main));
    }
    if size == 5 && counts.len() == 2 && attached(2) == 1 {
        return Some((PatternKind::TriplePair, main));
    }
    None
}

/// Four with two distinct singles (size 6) or two distinct pairs
/// (size 8). The two jokers together may not ride along as the singles,
/// and a joker pair can never be an attachment.
fn four_with_attachment(counts: &BTreeMap<i32, i32>, size: i32) -> Option<(PatternKind, i32)> {
    let fours: Vec<i32> = counts
        .iter()
        .filter(|(_, &n)| n == 4)
        .map(|(&rank, _)| rank)
        .collect();
    if fours.len() != 1 {
        return None;
    }
    let main = fours[0];
    if main > RANK_TWO {
        return None;
    }
    if size == 6 && counts.len() == 3 {
        let singles = counts
            .iter()
            .filter(|(&rank, &n)| rank != main && n == 1)
            .count();
        let both_jokers = counts.get(&SMALL_JOKER) == Some(&1)
            && counts.get(&BIG_JOKER) == Some(&1);
        if singles == 2 && !both_jokers {
            return Some((PatternKind::FourWithTwoSingles, main));
        }
    }
    if size == 8 && counts.len() == 3 {
        let pairs: Vec<i32> = counts
            .iter()
            .filter(|(&rank, &n)| rank != main && n == 2)
            .map(|(&rank, _)| rank)
            .collect();
        if pairs.len() == 2 && pairs.iter().all(|&rank| rank < SMALL_JOKER) {
            return Some((PatternKind::FourWithTwoPairs, main));
        }
    }
    None
}

/// Straight, pair straight and airplane. None of these may contain the
/// two or a joker, anywhere in the set — attachments included.
fn straight_family(counts: &BTreeMap<i32, i32>, size: i32) -> Option<(PatternKind, i32, i32)> {
    if counts.keys().any(|&rank| rank >= RANK_TWO) {
        return None;
    }
    let ranks: Vec<i32> = counts.keys().copied().collect();
    let consecutive = ranks.windows(2).all(|w| w[1] - w[0] == 1);
    let top = *ranks.last().expect("a non-empty set has a top rank");

    if size >= 5 && counts.values().all(|&n| n == 1) && consecutive && top <= MAX_SEQUENCE_RANK {
        return Some((PatternKind::Straight, top, size));
    }
    if size >= 6
        && size % 2 == 0
        && counts.len() >= 3
        && counts.values().all(|&n| n == 2)
        && consecutive
        && top <= MAX_SEQUENCE_RANK
    {
        return Some((PatternKind::PairStraight, top, counts.len() as i32));
    }
    airplane(counts, size)
}

/// Airplane: at least two consecutive triples, optionally carrying one
/// single per triple or one pair per triple. The plane itself is the
/// longest consecutive run of ranks holding three or more cards.
fn airplane(counts: &BTreeMap<i32, i32>, size: i32) -> Option<(PatternKind, i32, i32)> {
    let mut triple_ranks: Vec<i32> = counts
        .iter()
        .filter(|(&rank, &n)| n >= 3 && rank <= MAX_SEQUENCE_RANK)
        .map(|(&rank, _)| rank)
        .collect();
    if triple_ranks.len() < 2 {
        return None;
    }
    triple_ranks.sort_by(|a, b| b.cmp(a));
    let run = longest_consecutive_run(&triple_ranks);
    if run.len() < 2 {
        return None;
    }
    let plane_len = run.len() as i32;
    let extra = size - plane_len * 3;
    let main = run[0];

    // Whatever is not part of the plane has to form the attachments
    let mut remainder = counts.clone();
    for rank in &run {
        let n = remainder
            .get_mut(rank)
            .expect("plane ranks come from the counts");
        *n -= 3;
        if *n == 0 {
            remainder.remove(rank);
        }
    }
    if extra == 0 {
        return Some((PatternKind::AirplaneStraight, main, plane_len));
    }
    if extra == plane_len {
        let singles = remainder.values().filter(|&&n| n >= 1).count() as i32;
        if singles >= plane_len {
            return Some((PatternKind::AirplaneStraight, main, plane_len));
        }
    }
    if extra == plane_len * 2 {
        let pairs = remainder.values().filter(|&&n| n >= 2).count() as i32;
        if pairs >= plane_len {
            return Some((PatternKind::AirplaneStraight, main, plane_len));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::cards::cards_from_ranks as cards;

    struct ClassifyScenario {
        name: &'static str,
        ranks: Vec<i32>,
        kind: PatternKind,
        main_rank: i32,
        length: i32,
    }

    #[test]
    fn test_classification_table() {
        let scenarios = [
            ClassifyScenario {
                name: "one card is a single",
                ranks: vec![7],
                kind: PatternKind::Single,
                main_rank: 7,
                length: 0,
            },
            ClassifyScenario {
                name: "a lone big joker is a single",
                ranks: vec![17],
                kind: PatternKind::Single,
                main_rank: 17,
                length: 0,
            },
            ClassifyScenario {
                name: "two twos are a pair",
                ranks: vec![15, 15],
                kind: PatternKind::Pair,
                main_rank: 15,
                length: 0,
            },
            ClassifyScenario {
                name: "both jokers are the rocket, not a pair",
                ranks: vec![16, 17],
                kind: PatternKind::Rocket,
                main_rank: 17,
                length: 0,
            },
            ClassifyScenario {
                name: "three of a kind",
                ranks: vec![9, 9, 9],
                kind: PatternKind::Triple,
                main_rank: 9,
                length: 0,
            },
            ClassifyScenario {
                name: "four threes are a bomb",
                ranks: vec![3, 3, 3, 3],
                kind: PatternKind::Bomb,
                main_rank: 3,
                length: 0,
            },
            ClassifyScenario {
                name: "four twos are still a bomb",
                ranks: vec![15, 15, 15, 15],
                kind: PatternKind::Bomb,
                main_rank: 15,
                length: 0,
            },
            ClassifyScenario {
                name: "triple with a single attached",
                ranks: vec![5, 5, 5, 9],
                kind: PatternKind::TripleSingle,
                main_rank: 5,
                length: 0,
            },
            ClassifyScenario {
                name: "triple with a joker attached",
                ranks: vec![5, 5, 5, 17],
                kind: PatternKind::TripleSingle,
                main_rank: 5,
                length: 0,
            },
            ClassifyScenario {
                name: "aces over kings is a triple pair",
                ranks: vec![14, 14, 14, 13, 13],
                kind: PatternKind::TriplePair,
                main_rank: 14,
                length: 0,
            },
            ClassifyScenario {
                name: "five consecutive singles are a straight",
                ranks: vec![3, 4, 5, 6, 7],
                kind: PatternKind::Straight,
                main_rank: 7,
                length: 5,
            },
            ClassifyScenario {
                name: "ten through ace straight tops out at the ace",
                ranks: vec![10, 11, 12, 13, 14],
                kind: PatternKind::Straight,
                main_rank: 14,
                length: 5,
            },
            ClassifyScenario {
                name: "straights cannot run through the two",
                ranks: vec![11, 12, 13, 14, 15],
                kind: PatternKind::Invalid,
                main_rank: 0,
                length: 0,
            },
            ClassifyScenario {
                name: "four consecutive singles are too short",
                ranks: vec![3, 4, 5, 6],
                kind: PatternKind::Invalid,
                main_rank: 0,
                length: 0,
            },
            ClassifyScenario {
                name: "three consecutive pairs",
                ranks: vec![8, 8, 9, 9, 10, 10],
                kind: PatternKind::PairStraight,
                main_rank: 10,
                length: 3,
            },
            ClassifyScenario {
                name: "two consecutive pairs are too short",
                ranks: vec![8, 8, 9, 9],
                kind: PatternKind::Invalid,
                main_rank: 0,
                length: 0,
            },
            ClassifyScenario {
                name: "bare airplane of two triples",
                ranks: vec![6, 6, 6, 7, 7, 7],
                kind: PatternKind::AirplaneStraight,
                main_rank: 7,
                length: 2,
            },
            ClassifyScenario {
                name: "airplane carrying one single per triple",
                ranks: vec![6, 6, 6, 7, 7, 7, 3, 9],
                kind: PatternKind::AirplaneStraight,
                main_rank: 7,
                length: 2,
            },
            ClassifyScenario {
                name: "airplane carrying one pair per triple",
                ranks: vec![6, 6, 6, 7, 7, 7, 3, 3, 9, 9],
                kind: PatternKind::AirplaneStraight,
                main_rank: 7,
                length: 2,
            },
            ClassifyScenario {
                name: "airplane attachments cannot include a two",
                ranks: vec![6, 6, 6, 7, 7, 7, 15, 9],
                kind: PatternKind::Invalid,
                main_rank: 0,
                length: 0,
            },
            ClassifyScenario {
                name: "airplane with a lopsided attachment count",
                ranks: vec![6, 6, 6, 7, 7, 7, 9],
                kind: PatternKind::Invalid,
                main_rank: 0,
                length: 0,
            },
            ClassifyScenario {
                name: "non-consecutive triples are not an airplane",
                ranks: vec![6, 6, 6, 8, 8, 8],
                kind: PatternKind::Invalid,
                main_rank: 0,
                length: 0,
            },
            ClassifyScenario {
                name: "four with two distinct singles",
                ranks: vec![10, 10, 10, 10, 3, 5],
                kind: PatternKind::FourWithTwoSingles,
                main_rank: 10,
                length: 0,
            },
            ClassifyScenario {
                name: "four may not carry both jokers as its singles",
                ranks: vec![10, 10, 10, 10, 16, 17],
                kind: PatternKind::Invalid,
                main_rank: 0,
                length: 0,
            },
            ClassifyScenario {
                name: "four with two distinct pairs",
                ranks: vec![10, 10, 10, 10, 4, 4, 6, 6],
                kind: PatternKind::FourWithTwoPairs,
                main_rank: 10,
                length: 0,
            },
            ClassifyScenario {
                name: "four with a single pair is nothing",
                ranks: vec![10, 10, 10, 10, 4, 4],
                kind: PatternKind::Invalid,
                main_rank: 0,
                length: 0,
            },
            ClassifyScenario {
                name: "two fours of a kind read as an airplane with singles",
                ranks: vec![3, 3, 3, 3, 4, 4, 4, 4],
                kind: PatternKind::AirplaneStraight,
                main_rank: 4,
                length: 2,
            },
            ClassifyScenario {
                name: "empty input is invalid",
                ranks: vec![],
                kind: PatternKind::Invalid,
                main_rank: 0,
                length: 0,
            },
            ClassifyScenario {
                name: "out of range ranks are invalid",
                ranks: vec![2],
                kind: PatternKind::Invalid,
                main_rank: 0,
                length: 0,
            },
        ];
        for scenario in scenarios {
            let pattern = classify(&cards(&scenario.ranks));
            assert_eq!(pattern.kind, scenario.kind, "{}", scenario.name);
            if scenario.kind != PatternKind::Invalid {
                assert_eq!(pattern.main_rank, scenario.main_rank, "{}", scenario.name);
                assert_eq!(pattern.length, scenario.length, "{}", scenario.name);
            }
        }
    }

    #[test]
    fn test_opening_play_is_always_legal() {
        let single = classify(&cards(&[3]));
        assert!(single.beats(None));
        let invalid = classify(&cards(&[3, 5]));
        assert!(!invalid.beats(None), "an invalid set never plays");
    }

    #[test]
    fn test_rocket_beats_everything() {
        let rocket = classify(&cards(&[16, 17]));
        let bomb = classify(&cards(&[15, 15, 15, 15]));
        let single = classify(&cards(&[17]));
        assert!(rocket.beats(Some(&bomb)));
        assert!(rocket.beats(Some(&single)));
        assert!(!bomb.beats(Some(&rocket)));
        assert!(!single.beats(Some(&rocket)));
    }

    #[test]
    fn test_bomb_ordering() {
        let low_bomb = classify(&cards(&[4, 4, 4, 4]));
        let high_bomb = classify(&cards(&[9, 9, 9, 9]));
        let straight = classify(&cards(&[3, 4, 5, 6, 7]));
        assert!(low_bomb.beats(Some(&straight)), "a bomb beats any non-bomb");
        assert!(high_bomb.beats(Some(&low_bomb)));
        assert!(!low_bomb.beats(Some(&high_bomb)));
        assert!(!straight.beats(Some(&low_bomb)));
    }

    #[test]
    fn test_straights_require_equal_length() {
        let five_long = classify(&cards(&[3, 4, 5, 6, 7]));
        let six_long = classify(&cards(&[4, 5, 6, 7, 8, 9]));
        let higher_five = classify(&cards(&[5, 6, 7, 8, 9]));
        assert!(
            !six_long.beats(Some(&five_long)),
            "longer straights do not beat shorter ones"
        );
        assert!(higher_five.beats(Some(&five_long)));
        assert!(!five_long.beats(Some(&higher_five)));
    }

    #[test]
    fn test_cross_kind_comparisons_fail() {
        let pair = classify(&cards(&[9, 9]));
        let triple = classify(&cards(&[4, 4, 4]));
        assert!(!pair.beats(Some(&triple)));
        assert!(!triple.beats(Some(&pair)));
        let four_singles = classify(&cards(&[10, 10, 10, 10, 3, 5]));
        let four_pairs = classify(&cards(&[9, 9, 9, 9, 4, 4, 6, 6]));
        assert!(
            !four_singles.beats(Some(&four_pairs)),
            "the two four-with kinds never compare against each other"
        );
        assert!(!four_pairs.beats(Some(&four_singles)));
    }

    #[test]
    fn test_beats_is_antisymmetric_for_comparable_patterns() {
        let comparable = [
            (cards(&[5]), cards(&[11])),
            (cards(&[5, 5]), cards(&[11, 11])),
            (cards(&[3, 4, 5, 6, 7]), cards(&[4, 5, 6, 7, 8])),
            (cards(&[4, 4, 4, 4]), cards(&[12, 12, 12, 12])),
            (cards(&[6, 6, 6, 3]), cards(&[9, 9, 9, 4])),
        ];
        for (a, b) in comparable {
            let pa = classify(&a);
            let pb = classify(&b);
            assert_ne!(
                pa.beats(Some(&pb)),
                pb.beats(Some(&pa)),
                "exactly one of two distinct comparable patterns wins: {:?} vs {:?}",
                pa.kind,
                pb.kind
            );
        }
    }
}

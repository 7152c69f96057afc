use enum_iterator::{all, Sequence};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Highest ordinary rank: the "2", which outranks the ace
pub const RANK_TWO: i32 = 15;
pub const SMALL_JOKER: i32 = 16;
pub const BIG_JOKER: i32 = 17;

pub const DECK_SIZE: usize = 54;
pub const CARDS_PER_HAND: usize = 17;
pub const LANDLORD_CARD_COUNT: usize = 3;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence, Serialize, Deserialize,
)]
pub enum Suit {
    Spades,
    Hearts,
    Clubs,
    Diamonds,
    /// Jokers carry no suit
    None,
}

impl Suit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Clubs => "♣",
            Suit::Diamonds => "♦",
            Suit::None => "",
        }
    }
}

/// A physical card. Ranks run 3..=13 for the numeric faces, then
/// 14 = ace, 15 = two (the highest ordinary rank), 16/17 = the jokers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: i32,
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.suit.cmp(&other.suit))
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn rank_name(rank: i32) -> String {
    match rank {
        BIG_JOKER => "BJ".to_string(),
        SMALL_JOKER => "SJ".to_string(),
        RANK_TWO => "2".to_string(),
        14 => "A".to_string(),
        13 => "K".to_string(),
        12 => "Q".to_string(),
        11 => "J".to_string(),
        _ => rank.to_string(),
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.suit.symbol(), rank_name(self.rank))
    }
}

static DECK_TEMPLATE: Lazy<Vec<Card>> = Lazy::new(|| {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for suit in all::<Suit>() {
        if suit == Suit::None {
            continue;
        }
        for rank in 3..=RANK_TWO {
            cards.push(Card { suit, rank });
        }
    }
    cards.push(Card {
        suit: Suit::None,
        rank: SMALL_JOKER,
    });
    cards.push(Card {
        suit: Suit::None,
        rank: BIG_JOKER,
    });
    cards
});

/// A fresh 54-card deck, shuffled.
pub fn deck() -> Vec<Card> {
    let mut cards = DECK_TEMPLATE.clone();
    cards.shuffle(&mut thread_rng());
    cards
}

/// Hands are kept sorted by descending rank so index-based card
/// selection matches what a player sees.
pub fn sort_hand(hand: &mut [Card]) {
    hand.sort_by(|a, b| b.cmp(a));
}

/// One deal: three 17-card hands plus the three landlord cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub hands: [Vec<Card>; 3],
    pub landlord_cards: Vec<Card>,
}

pub fn deal() -> Deal {
    let mut cards = deck();
    let landlord_cards: Vec<Card> = cards.drain(..LANDLORD_CARD_COUNT).collect();
    let mut hands: [Vec<Card>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for hand in hands.iter_mut() {
        *hand = cards.drain(..CARDS_PER_HAND).collect();
        sort_hand(hand);
    }
    assert!(
        cards.is_empty(),
        "a deal must consume the whole deck: {} cards left over",
        cards.len()
    );
    Deal {
        hands,
        landlord_cards,
    }
}

/// Test helper: build cards from bare ranks, spreading suits so no
/// physical card repeats. Jokers get no suit.
#[cfg(test)]
pub fn cards_from_ranks(ranks: &[i32]) -> Vec<Card> {
    let suits = [Suit::Spades, Suit::Hearts, Suit::Clubs, Suit::Diamonds];
    let mut used: std::collections::HashMap<i32, usize> = std::collections::HashMap::new();
    ranks
        .iter()
        .map(|&rank| {
            if rank >= SMALL_JOKER {
                return Card {
                    suit: Suit::None,
                    rank,
                };
            }
            let slot = used.entry(rank).or_insert(0);
            let suit = suits[*slot % suits.len()];
            *slot += 1;
            Card { suit, rank }
        })
        .collect()
}

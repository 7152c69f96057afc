/*
Game: Dou Dizhu (Fight the Landlord)
Three players, one landlord against two allied farmers; bid for the
landlord seat, then shed cards in beats-or-pass tricks until a hand
is empty.
*/

pub mod autoplay;
pub mod cards;
pub mod enumerate;
pub mod pattern;
pub mod session;

// Re-export the main types
pub use autoplay::{select_bid, select_play, TieBreak};
pub use cards::{deal, deck, Card, Deal, Suit};
pub use enumerate::{all_valid_plays, beating_plays};
pub use pattern::{classify, Pattern, PatternKind};
pub use session::{
    Action, ActionError, Economy, Event, GameOutcome, GameSession, ParticipantId, Phase,
    Scheduler, SessionConfig, SharedSession, Stats, TimerId, TimerOwner,
};

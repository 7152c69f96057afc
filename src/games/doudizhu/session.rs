use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::autoplay::{select_bid, select_play, TieBreak};
use super::cards::{deal, sort_hand, Card};
use super::pattern::{classify, Pattern, PatternKind};

pub type ParticipantId = Uuid;

pub const MAX_SEATS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Waiting,
    Bidding,
    Playing,
    Finished,
}

/// Everything the session tracks per participant. Sticky flags live here
/// rather than in per-flag maps so the invariants stay in one place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: ParticipantId,
    pub name: String,
    pub hand: Vec<Card>,
    pub ready: bool,
    pub connected: bool,
    pub auto_play: bool,
    /// Set only when the participant turned auto-play on themselves;
    /// decides whether the flag survives into the next game.
    pub auto_explicit: bool,
    pub bid: Option<u8>,
}

/// A participant-facing game action. The lobby-side operations (join,
/// leave, ready) are plain methods; these are the in-game moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Bid(u8),
    Play(Vec<usize>),
    Pass,
    ToggleAuto,
}

/// Rejected input. Nothing in the session changes when one of these
/// comes back; the caller is free to submit again.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    #[error("participant is not seated in this room")]
    NotInRoom,
    #[error("participant is already seated in this room")]
    AlreadySeated,
    #[error("the room already has three seats")]
    RoomFull,
    #[error("action does not apply to the current phase")]
    WrongPhase,
    #[error("it is not this participant's turn")]
    NotYourTurn,
    #[error("bids run from 0 to 3")]
    BidOutOfRange,
    #[error("bid must be higher than the current bid of {0}")]
    BidTooLow(u8),
    #[error("card selection is empty, repeated or out of range")]
    InvalidCardIndices,
    #[error("selected cards do not form a playable pattern")]
    InvalidPattern,
    #[error("selected cards do not beat the last play")]
    CannotBeat,
    #[error("cannot pass on the opening play")]
    CannotPassFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    LandlordWin,
    FarmerWin,
}

/// Presentation-facing record of a state transition. The session appends
/// these as it moves and the embedder drains them with `take_events`; the
/// core itself owns no display logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    StateChanged {
        phase: Phase,
    },
    SeatJoined {
        participant: ParticipantId,
        name: String,
    },
    SeatLeft {
        participant: ParticipantId,
    },
    ReadyChanged {
        participant: ParticipantId,
        ready: bool,
    },
    ConnectionChanged {
        participant: ParticipantId,
        connected: bool,
    },
    HandChanged {
        participant: ParticipantId,
        hand: Vec<Card>,
    },
    LandlordCardsRevealed {
        cards: Vec<Card>,
    },
    BidAnnounced {
        participant: ParticipantId,
        score: u8,
    },
    LandlordConfirmed {
        participant: ParticipantId,
        bid: u8,
    },
    TurnStarted {
        participant: ParticipantId,
        timeout_secs: u32,
    },
    TrickPlayed {
        participant: ParticipantId,
        kind: PatternKind,
        cards: Vec<Card>,
    },
    Passed {
        participant: ParticipantId,
    },
    TrickReset {
        leader: ParticipantId,
    },
    MultiplierChanged {
        multiplier: i64,
    },
    AutoPlayChanged {
        participant: ParticipantId,
        enabled: bool,
    },
    GameEnded {
        outcome: GameOutcome,
        deltas: Vec<(ParticipantId, i64)>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOwner {
    Participant(ParticipantId),
    Session,
}

/// Countdown contract. The session starts and cancels countdowns; the
/// embedder routes each expiry back in through `timer_expired`. How the
/// clock actually runs is not the session's business.
pub trait Scheduler {
    fn start_countdown(&mut self, owner: TimerOwner, seconds: u32) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

/// A scheduler whose countdowns never come back. Simulations drive every
/// seat on auto-play, so nothing ever waits on a clock.
#[derive(Debug, Default)]
pub struct NullScheduler {
    next: u64,
}

impl Scheduler for NullScheduler {
    fn start_countdown(&mut self, _owner: TimerOwner, _seconds: u32) -> TimerId {
        self.next += 1;
        TimerId(self.next)
    }

    fn cancel(&mut self, _id: TimerId) {}
}

/// Wager settlement at game end. Only consulted when wagering is on.
pub trait Economy {
    fn transfer(&mut self, from: ParticipantId, to: ParticipantId, amount: i64) -> bool;
}

/// Result bookkeeping at game end.
pub trait Stats {
    fn record_result(&mut self, participant: ParticipantId, won: bool, points_delta: i64);
}

pub struct NoStats;

impl Stats for NoStats {
    fn record_result(&mut self, _participant: ParticipantId, _won: bool, _points_delta: i64) {}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub turn_timeout_secs: u32,
    pub bid_timeout_secs: u32,
    pub grace_delay_secs: u32,
    /// Currency moved per multiplier point when wagering is on
    pub wager_unit: i64,
    pub wager_enabled: bool,
    pub tiebreak: TieBreak,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            turn_timeout_secs: 60,
            bid_timeout_secs: 30,
            grace_delay_secs: 5,
            wager_unit: 100,
            wager_enabled: false,
            tiebreak: TieBreak::default(),
        }
    }
}

/// One room's worth of game state. All transitions go through `&mut self`,
/// so wrapping the session in `SharedSession` gives every caller — players
/// and timer callbacks alike — one critical section to line up behind.
pub struct GameSession {
    pub room: String,
    pub config: SessionConfig,
    pub phase: Phase,
    pub seats: Vec<Seat>,
    pub landlord_cards: Vec<Card>,
    pub played: Vec<Card>,
    pub bid_order: Vec<usize>,
    pub bid_turn: usize,
    pub highest_bid: u8,
    pub highest_bidder: Option<usize>,
    pub landlord: Option<usize>,
    pub last_played: Option<Pattern>,
    pub last_player: Option<usize>,
    pub pass_count: u32,
    pub multiplier: i64,
    pub current: Option<usize>,
    scheduler: Box<dyn Scheduler + Send>,
    stats: Box<dyn Stats + Send>,
    economy: Option<Box<dyn Economy + Send>>,
    turn_timers: HashMap<ParticipantId, TimerId>,
    reset_timer: Option<TimerId>,
    events: Vec<Event>,
}

pub type SharedSession = Arc<Mutex<GameSession>>;

impl GameSession {
    pub fn new(
        room: impl Into<String>,
        config: SessionConfig,
        scheduler: Box<dyn Scheduler + Send>,
        stats: Box<dyn Stats + Send>,
        economy: Option<Box<dyn Economy + Send>>,
    ) -> Self {
        GameSession {
            room: room.into(),
            config,
            phase: Phase::Waiting,
            seats: Vec::new(),
            landlord_cards: Vec::new(),
            played: Vec::new(),
            bid_order: Vec::new(),
            bid_turn: 0,
            highest_bid: 0,
            highest_bidder: None,
            landlord: None,
            last_played: None,
            last_player: None,
            pass_count: 0,
            multiplier: 1,
            current: None,
            scheduler,
            stats,
            economy,
            turn_timers: HashMap::new(),
            reset_timer: None,
            events: Vec::new(),
        }
    }

    pub fn with_defaults(room: impl Into<String>) -> Self {
        GameSession::new(
            room,
            SessionConfig::default(),
            Box::new(NullScheduler::default()),
            Box::new(NoStats),
            None,
        )
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn seat_index(&self, participant: ParticipantId) -> Option<usize> {
        self.seats.iter().position(|s| s.id == participant)
    }

    pub fn current_participant(&self) -> Option<ParticipantId> {
        self.current.map(|idx| self.seats[idx].id)
    }

    pub fn hand_of(&self, participant: ParticipantId) -> Option<&[Card]> {
        self.seat_index(participant)
            .map(|idx| self.seats[idx].hand.as_slice())
    }

    /// Drain the pending presentation events.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ---- membership ----

    pub fn join(
        &mut self,
        participant: ParticipantId,
        name: impl Into<String>,
    ) -> Result<(), ActionError> {
        if self.phase != Phase::Waiting {
            return Err(ActionError::WrongPhase);
        }
        if self.seat_index(participant).is_some() {
            return Err(ActionError::AlreadySeated);
        }
        if self.seats.len() >= MAX_SEATS {
            return Err(ActionError::RoomFull);
        }
        let name = name.into();
        self.seats.push(Seat {
            id: participant,
            name: name.clone(),
            hand: Vec::new(),
            ready: false,
            connected: true,
            auto_play: false,
            auto_explicit: false,
            bid: None,
        });
        self.events.push(Event::SeatJoined { participant, name });
        Ok(())
    }

    pub fn leave(&mut self, participant: ParticipantId) -> Result<(), ActionError> {
        let idx = self.seat_index(participant).ok_or(ActionError::NotInRoom)?;
        if self.phase == Phase::Waiting {
            self.seats.remove(idx);
            self.events.push(Event::SeatLeft { participant });
            Ok(())
        } else {
            // Walking out mid-game is a disconnect: the seat plays itself
            self.disconnect(participant)
        }
    }

    pub fn set_ready(
        &mut self,
        participant: ParticipantId,
        ready: bool,
    ) -> Result<(), ActionError> {
        if self.phase != Phase::Waiting {
            return Err(ActionError::WrongPhase);
        }
        let idx = self.seat_index(participant).ok_or(ActionError::NotInRoom)?;
        self.seats[idx].ready = ready;
        self.events.push(Event::ReadyChanged { participant, ready });
        if self.seats.len() == MAX_SEATS && self.seats.iter().all(|s| s.ready) {
            self.start_round();
            self.pump();
        }
        Ok(())
    }

    // ---- in-game actions ----

    pub fn apply(
        &mut self,
        participant: ParticipantId,
        action: Action,
    ) -> Result<(), ActionError> {
        let idx = self.seat_index(participant).ok_or(ActionError::NotInRoom)?;
        match action {
            Action::ToggleAuto => {
                let enabled = !self.seats[idx].auto_play;
                self.seats[idx].auto_play = enabled;
                self.seats[idx].auto_explicit = enabled;
                self.events.push(Event::AutoPlayChanged {
                    participant,
                    enabled,
                });
                if enabled {
                    self.cancel_turn_timer(idx);
                    self.pump();
                }
                Ok(())
            }
            Action::Bid(score) => {
                if self.phase != Phase::Bidding {
                    return Err(ActionError::WrongPhase);
                }
                if self.current != Some(idx) {
                    return Err(ActionError::NotYourTurn);
                }
                if score > 3 {
                    return Err(ActionError::BidOutOfRange);
                }
                if score > 0 && score <= self.highest_bid {
                    return Err(ActionError::BidTooLow(self.highest_bid));
                }
                self.step_bid(idx, score);
                self.pump();
                Ok(())
            }
            Action::Play(indices) => {
                if self.phase != Phase::Playing {
                    return Err(ActionError::WrongPhase);
                }
                if self.current != Some(idx) {
                    return Err(ActionError::NotYourTurn);
                }
                let cards = self.cards_at(idx, &indices)?;
                let pattern = classify(&cards);
                if pattern.kind == PatternKind::Invalid {
                    return Err(ActionError::InvalidPattern);
                }
                if let Some(last) = &self.last_played {
                    if !pattern.beats(Some(last)) {
                        return Err(ActionError::CannotBeat);
                    }
                }
                self.step_play(idx, pattern);
                self.pump();
                Ok(())
            }
            Action::Pass => {
                if self.phase != Phase::Playing {
                    return Err(ActionError::WrongPhase);
                }
                if self.current != Some(idx) {
                    return Err(ActionError::NotYourTurn);
                }
                if self.last_played.is_none() && self.pass_count == 0 {
                    return Err(ActionError::CannotPassFirst);
                }
                self.step_pass(idx);
                self.pump();
                Ok(())
            }
        }
    }

    // ---- timers and disconnects ----

    /// Route a countdown expiry back into the session. Stale handles —
    /// anything already cancelled or superseded — are ignored.
    pub fn timer_expired(&mut self, id: TimerId) {
        if self.reset_timer == Some(id) {
            self.reset_timer = None;
            self.reset_to_waiting();
            return;
        }
        let participant = self
            .turn_timers
            .iter()
            .find(|(_, &timer)| timer == id)
            .map(|(&participant, _)| participant);
        let participant = match participant {
            Some(participant) => participant,
            None => {
                debug!("room {}: stale timer {:?} ignored", self.room, id);
                return;
            }
        };
        self.turn_timers.remove(&participant);
        let idx = match self.seat_index(participant) {
            Some(idx) => idx,
            None => return,
        };
        if self.current != Some(idx) {
            debug!("room {}: off-turn timer for {} ignored", self.room, self.seats[idx].name);
            return;
        }
        match self.phase {
            Phase::Bidding => {
                info!(
                    "room {}: {} ran out the bid clock, counts as a pass",
                    self.room, self.seats[idx].name
                );
                self.step_bid(idx, 0);
                self.pump();
            }
            Phase::Playing => {
                info!(
                    "room {}: {} ran out the play clock, auto-play takes over",
                    self.room, self.seats[idx].name
                );
                self.force_auto(idx);
                self.step_auto_play(idx);
                self.pump();
            }
            _ => {}
        }
    }

    pub fn disconnect(&mut self, participant: ParticipantId) -> Result<(), ActionError> {
        let idx = self.seat_index(participant).ok_or(ActionError::NotInRoom)?;
        if self.phase == Phase::Waiting {
            self.seats.remove(idx);
            self.events.push(Event::SeatLeft { participant });
            return Ok(());
        }
        self.seats[idx].connected = false;
        self.events.push(Event::ConnectionChanged {
            participant,
            connected: false,
        });
        self.force_auto(idx);
        self.cancel_turn_timer(idx);
        info!(
            "room {}: {} disconnected, auto-play takes over",
            self.room, self.seats[idx].name
        );
        self.pump();
        Ok(())
    }

    pub fn reconnect(&mut self, participant: ParticipantId) -> Result<(), ActionError> {
        let idx = self.seat_index(participant).ok_or(ActionError::NotInRoom)?;
        self.seats[idx].connected = true;
        self.events.push(Event::ConnectionChanged {
            participant,
            connected: true,
        });
        // The auto flag stays on until the player turns it off themselves
        Ok(())
    }

    /// Cancel everything outstanding; called when the room goes away.
    pub fn close(&mut self) {
        let pending: Vec<TimerId> = self.turn_timers.drain().map(|(_, timer)| timer).collect();
        for timer in pending {
            self.scheduler.cancel(timer);
        }
        if let Some(timer) = self.reset_timer.take() {
            self.scheduler.cancel(timer);
        }
        info!("room {}: closed", self.room);
    }

    /// Clear the finished game and go back to Waiting. Membership stays,
    /// minus seats that never reconnected; forced auto-play clears, an
    /// explicit toggle sticks.
    pub fn reset_to_waiting(&mut self) {
        let dropped: Vec<ParticipantId> = self
            .seats
            .iter()
            .filter(|s| !s.connected)
            .map(|s| s.id)
            .collect();
        self.seats.retain(|s| s.connected);
        for participant in dropped {
            self.events.push(Event::SeatLeft { participant });
        }
        for seat in self.seats.iter_mut() {
            seat.hand.clear();
            seat.ready = false;
            seat.bid = None;
            if seat.auto_play && !seat.auto_explicit {
                seat.auto_play = false;
                self.events.push(Event::AutoPlayChanged {
                    participant: seat.id,
                    enabled: false,
                });
            }
        }
        self.landlord = None;
        self.landlord_cards.clear();
        self.played.clear();
        self.last_played = None;
        self.last_player = None;
        self.pass_count = 0;
        self.multiplier = 1;
        self.highest_bid = 0;
        self.highest_bidder = None;
        self.bid_order.clear();
        self.bid_turn = 0;
        self.current = None;
        self.phase = Phase::Waiting;
        self.events.push(Event::StateChanged {
            phase: Phase::Waiting,
        });
        info!("room {}: back to waiting", self.room);
    }

    // ---- internals ----

    /// Deal and enter Bidding. Also the re-entry point when a bidding
    /// rotation ends with nobody bidding.
    fn start_round(&mut self) {
        self.phase = Phase::Bidding;
        self.multiplier = 1;
        self.highest_bid = 0;
        self.highest_bidder = None;
        self.landlord = None;
        self.last_played = None;
        self.last_player = None;
        self.pass_count = 0;
        self.played.clear();
        let deal = deal();
        for (seat, hand) in self.seats.iter_mut().zip(deal.hands.into_iter()) {
            seat.hand = hand;
            seat.bid = None;
        }
        self.landlord_cards = deal.landlord_cards;
        self.events.push(Event::StateChanged {
            phase: Phase::Bidding,
        });
        for seat in &self.seats {
            self.events.push(Event::HandChanged {
                participant: seat.id,
                hand: seat.hand.clone(),
            });
        }
        self.events.push(Event::LandlordCardsRevealed {
            cards: self.landlord_cards.clone(),
        });
        let mut order: Vec<usize> = (0..self.seats.len()).collect();
        order.shuffle(&mut thread_rng());
        self.bid_order = order;
        self.bid_turn = 0;
        self.current = Some(self.bid_order[0]);
        info!("room {}: dealt a new round, bidding begins", self.room);
    }

    /// Run the machine until it needs outside input again: every time the
    /// turn lands on an auto-play or disconnected seat, act for it on the
    /// spot; stop when a live seat is up (arming its countdown) or the
    /// game leaves Bidding/Playing.
    fn pump(&mut self) {
        loop {
            let idx = match (self.phase, self.current) {
                (Phase::Bidding, Some(idx)) | (Phase::Playing, Some(idx)) => idx,
                _ => return,
            };
            let seat = &self.seats[idx];
            if seat.connected && !seat.auto_play {
                self.arm_turn_timer(idx);
                return;
            }
            match self.phase {
                Phase::Bidding => {
                    let wanted = select_bid(&self.seats[idx].hand);
                    let score = if wanted <= self.highest_bid { 0 } else { wanted };
                    self.step_bid(idx, score);
                }
                Phase::Playing => self.step_auto_play(idx),
                _ => return,
            }
        }
    }

    fn arm_turn_timer(&mut self, idx: usize) {
        let participant = self.seats[idx].id;
        if self.turn_timers.contains_key(&participant) {
            return;
        }
        let seconds = match self.phase {
            Phase::Bidding => self.config.bid_timeout_secs,
            _ => self.config.turn_timeout_secs,
        };
        let timer = self
            .scheduler
            .start_countdown(TimerOwner::Participant(participant), seconds);
        self.turn_timers.insert(participant, timer);
        self.events.push(Event::TurnStarted {
            participant,
            timeout_secs: seconds,
        });
    }

    fn cancel_turn_timer(&mut self, idx: usize) {
        let participant = self.seats[idx].id;
        if let Some(timer) = self.turn_timers.remove(&participant) {
            self.scheduler.cancel(timer);
        }
    }

    fn force_auto(&mut self, idx: usize) {
        if !self.seats[idx].auto_play {
            self.seats[idx].auto_play = true;
            self.events.push(Event::AutoPlayChanged {
                participant: self.seats[idx].id,
                enabled: true,
            });
        }
    }

    fn step_bid(&mut self, idx: usize, score: u8) {
        self.cancel_turn_timer(idx);
        let participant = self.seats[idx].id;
        self.seats[idx].bid = Some(score);
        self.events.push(Event::BidAnnounced { participant, score });
        if score > 0 {
            self.highest_bid = score;
            self.highest_bidder = Some(idx);
            if score == 3 {
                self.confirm_landlord(idx);
                return;
            }
        }
        self.bid_turn += 1;
        if self.bid_turn >= self.bid_order.len() {
            match self.highest_bidder {
                Some(winner) => self.confirm_landlord(winner),
                None => {
                    info!(
                        "room {}: nobody bid, voiding the round and redealing",
                        self.room
                    );
                    self.start_round();
                }
            }
        } else {
            self.current = Some(self.bid_order[self.bid_turn]);
        }
    }

    fn confirm_landlord(&mut self, idx: usize) {
        let bid = self.highest_bid;
        self.landlord = Some(idx);
        let extra: Vec<Card> = self.landlord_cards.drain(..).collect();
        let seat = &mut self.seats[idx];
        seat.hand.extend(extra);
        sort_hand(&mut seat.hand);
        let participant = seat.id;
        let hand = seat.hand.clone();
        self.multiplier = bid as i64;
        self.phase = Phase::Playing;
        self.current = Some(idx);
        self.pass_count = 0;
        self.last_played = None;
        self.last_player = None;
        self.events.push(Event::LandlordConfirmed { participant, bid });
        self.events.push(Event::HandChanged { participant, hand });
        self.events.push(Event::MultiplierChanged {
            multiplier: self.multiplier,
        });
        self.events.push(Event::StateChanged {
            phase: Phase::Playing,
        });
        info!(
            "room {}: {} takes the landlord seat at bid {}",
            self.room, self.seats[idx].name, bid
        );
    }

    fn cards_at(&self, idx: usize, indices: &[usize]) -> Result<Vec<Card>, ActionError> {
        if indices.is_empty() {
            return Err(ActionError::InvalidCardIndices);
        }
        let unique: std::collections::BTreeSet<usize> = indices.iter().copied().collect();
        if unique.len() != indices.len() {
            return Err(ActionError::InvalidCardIndices);
        }
        let hand = &self.seats[idx].hand;
        indices
            .iter()
            .map(|&i| {
                hand.get(i)
                    .copied()
                    .ok_or(ActionError::InvalidCardIndices)
            })
            .collect()
    }

    fn step_play(&mut self, idx: usize, pattern: Pattern) {
        self.cancel_turn_timer(idx);
        let participant = self.seats[idx].id;
        {
            let hand = &mut self.seats[idx].hand;
            for card in &pattern.cards {
                let pos = hand
                    .iter()
                    .position(|c| c == card)
                    .expect("played cards must come from the player's hand");
                hand.remove(pos);
            }
        }
        self.played.extend(pattern.cards.iter().copied());
        self.events.push(Event::TrickPlayed {
            participant,
            kind: pattern.kind,
            cards: pattern.cards.clone(),
        });
        self.events.push(Event::HandChanged {
            participant,
            hand: self.seats[idx].hand.clone(),
        });
        self.pass_count = 0;
        self.last_player = Some(idx);
        match pattern.kind {
            PatternKind::Bomb => {
                self.multiplier *= 2;
                self.events.push(Event::MultiplierChanged {
                    multiplier: self.multiplier,
                });
                debug!(
                    "room {}: bomb from {}, multiplier x{}",
                    self.room, self.seats[idx].name, self.multiplier
                );
                self.last_played = Some(pattern);
            }
            PatternKind::Rocket => {
                self.multiplier *= 4;
                self.events.push(Event::MultiplierChanged {
                    multiplier: self.multiplier,
                });
                debug!(
                    "room {}: rocket from {}, multiplier x{}",
                    self.room, self.seats[idx].name, self.multiplier
                );
                // Nobody can follow a rocket: the trick resolves on the spot
                self.last_played = None;
            }
            _ => self.last_played = Some(pattern),
        }
        if self.seats[idx].hand.is_empty() {
            self.finish_game(idx);
        } else {
            self.current = Some((idx + 1) % self.seats.len());
        }
    }

    fn step_pass(&mut self, idx: usize) {
        self.cancel_turn_timer(idx);
        let participant = self.seats[idx].id;
        self.pass_count += 1;
        self.events.push(Event::Passed { participant });
        if self.pass_count >= 2 {
            // Both opponents passed: the trick comes back to whoever played
            let leader = self
                .last_player
                .expect("two passes imply somebody played this trick");
            self.last_played = None;
            self.pass_count = 0;
            self.current = Some(leader);
            self.events.push(Event::TrickReset {
                leader: self.seats[leader].id,
            });
        } else {
            self.current = Some((idx + 1) % self.seats.len());
        }
    }

    fn step_auto_play(&mut self, idx: usize) {
        let hand = self.seats[idx].hand.clone();
        let last = self.last_played.clone();
        match select_play(&hand, last.as_ref(), self.config.tiebreak) {
            Some(play) => self.step_play(idx, play),
            None => self.step_pass(idx),
        }
    }

    fn finish_game(&mut self, winner: usize) {
        let landlord = self
            .landlord
            .expect("a finished game always has a landlord");
        let landlord_win = winner == landlord;
        self.phase = Phase::Finished;
        self.current = None;
        let pending: Vec<TimerId> = self.turn_timers.drain().map(|(_, timer)| timer).collect();
        for timer in pending {
            self.scheduler.cancel(timer);
        }
        let outcome = if landlord_win {
            GameOutcome::LandlordWin
        } else {
            GameOutcome::FarmerWin
        };
        let mut deltas: Vec<(ParticipantId, i64)> = Vec::new();
        let mut results: Vec<(ParticipantId, bool, i64)> = Vec::new();
        for (i, seat) in self.seats.iter().enumerate() {
            let is_landlord = i == landlord;
            let won = is_landlord == landlord_win;
            let magnitude = if is_landlord {
                self.multiplier * 2
            } else {
                self.multiplier
            };
            // A disconnected seat can lose points but never gain them
            let delta = if won {
                if seat.connected {
                    magnitude
                } else {
                    0
                }
            } else {
                -magnitude
            };
            deltas.push((seat.id, delta));
            results.push((seat.id, won, delta));
        }
        for (participant, won, delta) in results {
            self.stats.record_result(participant, won, delta);
        }
        self.settle_wagers(landlord, landlord_win);
        self.events.push(Event::StateChanged {
            phase: Phase::Finished,
        });
        self.events.push(Event::GameEnded { outcome, deltas });
        info!(
            "room {}: game over, {:?} at x{}",
            self.room, outcome, self.multiplier
        );
        let timer = self
            .scheduler
            .start_countdown(TimerOwner::Session, self.config.grace_delay_secs);
        self.reset_timer = Some(timer);
    }

    fn settle_wagers(&mut self, landlord: usize, landlord_win: bool) {
        if !self.config.wager_enabled {
            return;
        }
        let amount = self.multiplier * self.config.wager_unit;
        let landlord_id = self.seats[landlord].id;
        let farmers: Vec<ParticipantId> = self
            .seats
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != landlord)
            .map(|(_, seat)| seat.id)
            .collect();
        let economy = match self.economy.as_mut() {
            Some(economy) => economy,
            None => {
                warn!(
                    "room {}: wagering enabled but no economy attached",
                    self.room
                );
                return;
            }
        };
        for farmer in farmers {
            let (from, to) = if landlord_win {
                (farmer, landlord_id)
            } else {
                (landlord_id, farmer)
            };
            if !economy.transfer(from, to, amount) {
                warn!(
                    "room {}: wager transfer of {} did not go through",
                    self.room, amount
                );
            }
        }
    }
}

//! Module implementing the state machine of a single match.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{resolve, Choice, Outcome, Side};


/// Identifier of a player (chat user).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}

impl From<u64> for PlayerId {
    fn from(id: u64) -> Self {
        PlayerId(id)
    }
}


/// State of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatchState {
    /// The opponent has been challenged but nobody pressed "Play" yet.
    AwaitingChallengeResponse,
    /// The challenge has been accepted and players are making their choices.
    AwaitingChoices,
    /// Both players made their choices (terminal).
    Resolved(MatchResult),
    /// One of the players denied the challenge (terminal).
    Cancelled { by: PlayerId },
    /// Players took too long (terminal).
    TimedOut,
}

impl MatchState {
    /// Whether no further transitions are possible from this state.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(*self, MatchState::Resolved(..)
                      | MatchState::Cancelled{..}
                      | MatchState::TimedOut)
    }
}

/// Final result of a resolved match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub challenger: Choice,
    pub opponent: Choice,
    pub outcome: Outcome,
}

/// Change of the match state caused by a successful operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    /// The challenge has been accepted.
    Accepted { by: PlayerId },
    /// Challenge was accepted before; nothing changed.
    AlreadyAccepted,
    /// A player's choice has been recorded, but the other one is still pending.
    ChoiceRecorded { player: PlayerId, replaced: bool },
    /// The second choice came in and decided the match.
    Resolved(MatchResult),
    Cancelled { by: PlayerId },
    TimedOut,
}

/// Error for operations that a match doesn't allow.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("player {0} doesn't take part in this match")]
    NotAParticipant(PlayerId),
    #[error("match is already over")]
    Finished,
    #[error("challenge hasn't been accepted yet")]
    NotAccepted,
    #[error("players cannot challenge themselves")]
    SelfChallenge,
}


/// A single two-player game of Rock-Paper-Scissors.
#[derive(Clone, Debug)]
pub struct Match {
    /// Challenger (side A) & opponent (side B).
    players: [PlayerId; 2],
    choices: HashMap<PlayerId, Choice>,
    state: MatchState,
}

impl Match {
    /// Create a match where `challenger` challenges `opponent`.
    pub fn new(challenger: PlayerId, opponent: PlayerId) -> Result<Self, MatchError> {
        if challenger == opponent {
            return Err(MatchError::SelfChallenge);
        }
        Ok(Match{
            players: [challenger, opponent],
            choices: HashMap::with_capacity(2),
            state: MatchState::AwaitingChallengeResponse,
        })
    }
}

// Accessors.
impl Match {
    #[inline]
    pub fn challenger(&self) -> PlayerId { self.players[0] }
    #[inline]
    pub fn opponent(&self) -> PlayerId { self.players[1] }
    #[inline]
    pub fn players(&self) -> [PlayerId; 2] { self.players }

    #[inline]
    pub fn state(&self) -> MatchState {
        self.state
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Which side of the match the player is on, if any.
    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        match self.players.iter().position(|&p| p == player) {
            Some(0) => Some(Side::A),
            Some(_) => Some(Side::B),
            None => None,
        }
    }

    #[inline]
    pub fn has_chosen(&self, player: PlayerId) -> bool {
        self.choices.contains_key(&player)
    }

    /// Number of distinct players who made their choice so far.
    #[inline]
    pub fn choice_count(&self) -> usize {
        self.choices.len()
    }

    /// The winning player, if the match is resolved & not a draw.
    pub fn winner(&self) -> Option<PlayerId> {
        match self.state {
            MatchState::Resolved(MatchResult{outcome: Outcome::Winner(Side::A), ..}) => Some(self.challenger()),
            MatchState::Resolved(MatchResult{outcome: Outcome::Winner(Side::B), ..}) => Some(self.opponent()),
            _ => None,
        }
    }
}

// Operations.
impl Match {
    /// Accept the challenge (press "Play").
    ///
    /// Either participant may accept. Accepting again is a no-op.
    pub fn accept(&mut self, player: PlayerId) -> Result<Transition, MatchError> {
        self.check_active(player)?;
        match self.state {
            MatchState::AwaitingChallengeResponse => {
                self.state = MatchState::AwaitingChoices;
                Ok(Transition::Accepted{by: player})
            }
            _ => Ok(Transition::AlreadyAccepted),
        }
    }

    /// Deny (cancel) the match.
    pub fn deny(&mut self, player: PlayerId) -> Result<Transition, MatchError> {
        self.check_active(player)?;
        self.state = MatchState::Cancelled{by: player};
        Ok(Transition::Cancelled{by: player})
    }

    /// Record player's choice.
    ///
    /// Choosing again replaces the previous choice.
    /// The match is resolved as soon as both players have chosen.
    pub fn choose(&mut self, player: PlayerId, choice: Choice) -> Result<Transition, MatchError> {
        self.check_active(player)?;
        if self.state == MatchState::AwaitingChallengeResponse {
            return Err(MatchError::NotAccepted);
        }

        let replaced = self.choices.insert(player, choice).is_some();
        trace!("Player {} chose {} ({} of 2 choices)", player, choice, self.choices.len());

        match (self.choices.get(&self.challenger()), self.choices.get(&self.opponent())) {
            (Some(&a), Some(&b)) => {
                let result = MatchResult{challenger: a, opponent: b, outcome: resolve(a, b)};
                self.state = MatchState::Resolved(result);
                Ok(Transition::Resolved(result))
            }
            _ => Ok(Transition::ChoiceRecorded{player, replaced}),
        }
    }

    /// Time out the match.
    pub fn time_out(&mut self) -> Result<Transition, MatchError> {
        if self.is_finished() {
            return Err(MatchError::Finished);
        }
        self.state = MatchState::TimedOut;
        Ok(Transition::TimedOut)
    }

    fn check_active(&self, player: PlayerId) -> Result<(), MatchError> {
        if self.side_of(player).is_none() {
            return Err(MatchError::NotAParticipant(player));
        }
        if self.is_finished() {
            return Err(MatchError::Finished);
        }
        Ok(())
    }
}

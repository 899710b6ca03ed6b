//! Module with a thread-safe handle to a match.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::Choice;
use super::game::{Match, MatchError, PlayerId, Transition};


/// Shared, thread-safe handle to a `Match`.
///
/// Every operation is applied atomically with respect to the others,
/// so e.g. a timeout racing with the final choice results in exactly one
/// terminal transition.
#[derive(Clone, Debug)]
pub struct SharedMatch(Arc<Mutex<Match>>);

impl From<Match> for SharedMatch {
    fn from(m: Match) -> Self {
        SharedMatch(Arc::new(Mutex::new(m)))
    }
}

impl SharedMatch {
    #[inline]
    pub fn new(challenger: PlayerId, opponent: PlayerId) -> Result<Self, MatchError> {
        Match::new(challenger, opponent).map(Into::into)
    }

    #[inline]
    pub fn accept(&self, player: PlayerId) -> Result<Transition, MatchError> {
        self.lock().accept(player)
    }

    #[inline]
    pub fn deny(&self, player: PlayerId) -> Result<Transition, MatchError> {
        self.lock().deny(player)
    }

    #[inline]
    pub fn choose(&self, player: PlayerId, choice: Choice) -> Result<Transition, MatchError> {
        self.lock().choose(player, choice)
    }

    #[inline]
    pub fn time_out(&self) -> Result<Transition, MatchError> {
        self.lock().time_out()
    }

    /// Copy of the match as it is right now.
    pub fn snapshot(&self) -> Match {
        self.lock().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.lock().is_finished()
    }

    // A panic while holding the lock cannot leave `Match` half-updated,
    // as every operation assigns the new state in a single step.
    fn lock(&self) -> MutexGuard<Match> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

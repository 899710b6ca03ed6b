//! Module implementing the Rock-Paper-Scissors game.
//!
//! Resolution of a single turn is a pure function (`resolve`),
//! while the lifecycle of a two-player game is tracked by `Match`.

mod game;
mod shared;

pub use self::game::{Match, MatchError, MatchResult, MatchState, PlayerId, Transition};
pub use self::shared::SharedMatch;


use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;


/// A move in the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    /// All the possible choices.
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// The choice that this one wins against.
    #[inline]
    pub fn beats(self) -> Choice {
        match self {
            Choice::Rock => Choice::Scissors,
            Choice::Scissors => Choice::Paper,
            Choice::Paper => Choice::Rock,
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Choice::Rock => "rock",
            Choice::Paper => "paper",
            Choice::Scissors => "scissors",
        }
    }

    /// Emoji depicting the choice.
    #[inline]
    pub fn emoji(self) -> &'static str {
        match self {
            Choice::Rock => "\u{1FAA8}",
            Choice::Paper => "\u{1F4C4}",
            Choice::Scissors => "\u{2702}\u{FE0F}",
        }
    }
}

impl FromStr for Choice {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Choice::ALL.iter().cloned()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseChoiceError(s.to_owned()))
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}", self.name())
    }
}

/// Error when parsing a `Choice` from string.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid choice {0:?} (expected rock, paper or scissors)")]
pub struct ParseChoiceError(pub String);


/// One of the two sides of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Side {
    /// The player who issued the challenge.
    A,
    /// The challenged player.
    B,
}

/// Outcome of a single turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Draw,
    Winner(Side),
}

/// Decide the outcome of a turn where side A chose `a` and side B chose `b`.
pub fn resolve(a: Choice, b: Choice) -> Outcome {
    if a == b {
        Outcome::Draw
    } else if a.beats() == b {
        Outcome::Winner(Side::A)
    } else {
        Outcome::Winner(Side::B)
    }
}


#[cfg(test)]
mod tests {
    use spectral::prelude::*;
    use super::{resolve, Choice, Outcome, ParseChoiceError, Side};
    use super::Choice::*;

    #[test]
    fn outcome_table() {
        let cases = vec![
            (Rock, Rock, Outcome::Draw),
            (Rock, Paper, Outcome::Winner(Side::B)),
            (Rock, Scissors, Outcome::Winner(Side::A)),
            (Paper, Rock, Outcome::Winner(Side::A)),
            (Paper, Paper, Outcome::Draw),
            (Paper, Scissors, Outcome::Winner(Side::B)),
            (Scissors, Rock, Outcome::Winner(Side::B)),
            (Scissors, Paper, Outcome::Winner(Side::A)),
            (Scissors, Scissors, Outcome::Draw),
        ];
        for (a, b, expected) in cases {
            assert_eq!(expected, resolve(a, b), "{} vs {}", a, b);
        }
    }

    #[test]
    fn every_choice_beats_exactly_one() {
        for &c in Choice::ALL.iter() {
            let beaten = Choice::ALL.iter().filter(|&&other| resolve(c, other) == Outcome::Winner(Side::A)).count();
            assert_eq!(1, beaten);
        }
    }

    #[test]
    fn parse() {
        assert_that!("rock".parse::<Choice>()).is_ok().is_equal_to(Rock);
        assert_that!("PAPER".parse::<Choice>()).is_ok().is_equal_to(Paper);
        assert_that!(" Scissors ".parse::<Choice>()).is_ok().is_equal_to(Scissors);
        assert_that!("lizard".parse::<Choice>()).is_err()
            .is_equal_to(ParseChoiceError("lizard".into()));
    }

    #[test]
    fn deserialize() {
        assert_eq!(Rock, serde_json::from_str::<Choice>(r#""rock""#).unwrap());
        assert_eq!(Scissors, serde_json::from_str::<Choice>(r#""scissors""#).unwrap());
        assert!(serde_json::from_str::<Choice>(r#""Rock""#).is_err());
        assert_eq!(r#""paper""#, serde_json::to_string(&Paper).unwrap());
    }

    #[test]
    fn emoji() {
        assert_eq!("\u{1FAA8}", Rock.emoji());
        assert_eq!("\u{1F4C4}", Paper.emoji());
        assert_eq!("\u{2702}\u{FE0F}", Scissors.emoji());
    }
}

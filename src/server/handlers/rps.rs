//! Module with the rock-paper-scissors request handlers.
//!
//! Matches live in a `MatchRegistry` until they reach a terminal state,
//! at which point they're announced and removed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use memecap::rps::{Choice, Match, MatchResult, MatchState, Outcome, PlayerId, SharedMatch,
                   Side, Transition};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::service::AppState;
use super::util::{json_response, ApiError};


/// Identifier of a match in the registry.
pub type MatchId = u64;

const TIMED_OUT_MESSAGE: &str = "\u{23F0} Game timed out.";
const CHOOSE_MESSAGE: &str = "Choose your move:";
const RESULT_TITLE: &str = "Rock Paper Scissors Result";
const DRAW_MESSAGE: &str = "It's a draw! \u{1F91D}";
const CHOSEN_MARK: &str = "\u{2705}";
const PENDING_MARK: &str = "\u{2753}";


/// Matches that are still in progress.
#[derive(Debug, Default)]
pub struct MatchRegistry {
    matches: Mutex<HashMap<MatchId, SharedMatch>>,
    last_id: AtomicU64,
}

impl MatchRegistry {
    pub fn insert(&self, m: SharedMatch) -> MatchId {
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock().insert(id, m);
        id
    }

    pub fn get(&self, id: MatchId) -> Option<SharedMatch> {
        self.lock().get(&id).cloned()
    }

    pub fn remove(&self, id: MatchId) -> Option<SharedMatch> {
        let removed = self.lock().remove(&id);
        if removed.is_some() {
            trace!("Match #{} removed from the registry", id);
        }
        removed
    }

    /// Number of matches in progress.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Number of matches created so far.
    pub fn created(&self) -> u64 {
        self.last_id.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<HashMap<MatchId, SharedMatch>> {
        self.matches.lock().unwrap_or_else(PoisonError::into_inner)
    }
}


#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ChallengeRequest {
    pub challenger: PlayerId,
    pub opponent: PlayerId,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PlayerRequest {
    pub player: PlayerId,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChoiceRequest {
    pub player: PlayerId,
    pub choice: String,
}

/// Representation of a match in responses.
#[derive(Debug, Serialize)]
struct MatchView {
    id: MatchId,
    #[serde(flatten)]
    state: MatchState,
    challenger: PlayerId,
    opponent: PlayerId,
    board: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ResultView>,
}

#[derive(Debug, Serialize)]
struct ResultView {
    title: &'static str,
    description: String,
}

impl MatchView {
    fn of(id: MatchId, m: &Match) -> Self {
        let result = match m.state() {
            MatchState::Resolved(ref result) => Some(ResultView{
                title: RESULT_TITLE,
                description: result_text(m, result),
            }),
            _ => None,
        };
        MatchView{
            id,
            state: m.state(),
            challenger: m.challenger(),
            opponent: m.opponent(),
            board: board(m),
            message: None,
            result,
        }
    }

    fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }

    fn into_response(self, status_code: StatusCode) -> Response {
        match serde_json::to_value(&self) {
            Ok(json) => json_response(status_code, json),
            Err(e) => super::util::error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
        }
    }
}


/// Handle `POST /rps`: one player challenging another.
pub async fn create_match(State(state): State<AppState>,
                          body: Result<Json<ChallengeRequest>, JsonRejection>) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(bad_json)?;
    let m = SharedMatch::new(request.challenger, request.opponent)?;
    let id = state.matches.insert(m.clone());
    info!("Match #{}: {} challenged {}", id, request.challenger, request.opponent);

    schedule_timeout(state.matches.clone(), id, m.clone(), state.match_timeout);

    let message = format!("{} has challenged {} to Rock Paper Scissors!",
        mention(request.challenger), mention(request.opponent));
    Ok(MatchView::of(id, &m.snapshot()).with_message(message).into_response(StatusCode::CREATED))
}

/// Handle `GET /rps/{id}`.
pub async fn get_match(State(state): State<AppState>,
                       Path(id): Path<MatchId>) -> Result<Response, ApiError> {
    let m = lookup(&state, id)?;
    Ok(MatchView::of(id, &m.snapshot()).into_response(StatusCode::OK))
}

/// Handle `POST /rps/{id}/accept`, i.e. pressing "Play".
pub async fn accept(State(state): State<AppState>,
                    Path(id): Path<MatchId>,
                    body: Result<Json<PlayerRequest>, JsonRejection>) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(bad_json)?;
    let m = lookup(&state, id)?;
    match m.accept(request.player)? {
        Transition::Accepted{by} => info!("Match #{}: accepted by {}", id, by),
        _ => trace!("Match #{} was already accepted", id),
    }
    Ok(MatchView::of(id, &m.snapshot()).with_message(CHOOSE_MESSAGE).into_response(StatusCode::OK))
}

/// Handle `POST /rps/{id}/deny`, i.e. cancelling the match.
pub async fn deny(State(state): State<AppState>,
                  Path(id): Path<MatchId>,
                  body: Result<Json<PlayerRequest>, JsonRejection>) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(bad_json)?;
    let m = lookup(&state, id)?;
    m.deny(request.player)?;
    info!("Match #{}: cancelled by {}", id, request.player);
    state.matches.remove(id);

    let message = format!("{} has cancelled the game.", mention(request.player));
    Ok(MatchView::of(id, &m.snapshot()).with_message(message).into_response(StatusCode::OK))
}

/// Handle `POST /rps/{id}/choice`.
pub async fn choose(State(state): State<AppState>,
                    Path(id): Path<MatchId>,
                    body: Result<Json<ChoiceRequest>, JsonRejection>) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(bad_json)?;
    let choice: Choice = request.choice.parse()
        .map_err(|e| ApiError::BadRequest(format!("{}", e)))?;
    let m = lookup(&state, id)?;

    match m.choose(request.player, choice)? {
        Transition::Resolved(result) => {
            info!("Match #{}: {} vs {}, {:?}", id, result.challenger, result.opponent, result.outcome);
            state.matches.remove(id);
        }
        Transition::ChoiceRecorded{replaced: true, ..} =>
            debug!("Match #{}: {} changed their choice", id, request.player),
        _ => debug!("Match #{}: {} made their choice", id, request.player),
    }
    Ok(MatchView::of(id, &m.snapshot()).with_message(chosen_message(choice))
        .into_response(StatusCode::OK))
}


fn lookup(state: &AppState, id: MatchId) -> Result<SharedMatch, ApiError> {
    state.matches.get(id).ok_or_else(|| ApiError::NotFound(format!("no such match: #{}", id)))
}

fn bad_json(e: JsonRejection) -> ApiError {
    ApiError::BadRequest(format!("cannot decode request: {}", e.body_text()))
}

/// Time the match out after given duration, unless it's finished by then.
fn schedule_timeout(registry: Arc<MatchRegistry>, id: MatchId, m: SharedMatch, after: Duration) {
    if after.is_zero() {
        return;
    }
    tokio::spawn(async move {
        sleep(after).await;
        match m.time_out() {
            Ok(_) => {
                info!("Match #{}: {}", id, TIMED_OUT_MESSAGE);
                registry.remove(id);
            }
            Err(_) => trace!("Match #{} finished before its timeout", id),
        }
    });
}


// Rendering of messages.

fn mention(player: PlayerId) -> String {
    format!("<@{}>", player)
}

/// Render the list of players, marking those who have already chosen.
fn board(m: &Match) -> String {
    m.players().iter()
        .map(|&p| format!("{}: {}", mention(p), if m.has_chosen(p) { CHOSEN_MARK } else { PENDING_MARK }))
        .collect::<Vec<_>>()
        .join("\n")
}

fn chosen_message(choice: Choice) -> String {
    let name = choice.name();
    let mut label = name[..1].to_uppercase();
    label.push_str(&name[1..]);
    format!("You chose {} **{}**!", choice.emoji(), label)
}

fn result_text(m: &Match, result: &MatchResult) -> String {
    let verdict = match result.outcome {
        Outcome::Draw => DRAW_MESSAGE.to_owned(),
        Outcome::Winner(Side::A) => format!("{} wins!", mention(m.challenger())),
        Outcome::Winner(Side::B) => format!("{} wins!", mention(m.opponent())),
    };
    format!("{} {} vs {} {}\n\n## {}",
        mention(m.challenger()), result.challenger.emoji(),
        result.opponent.emoji(), mention(m.opponent()),
        verdict)
}


#[cfg(test)]
mod tests {
    use memecap::rps::{Choice, Match, MatchState, PlayerId, SharedMatch};

    use super::{board, chosen_message, result_text, MatchRegistry};

    const ALICE: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);

    #[test]
    fn registry() {
        let registry = MatchRegistry::default();
        let first = registry.insert(SharedMatch::new(ALICE, BOB).unwrap());
        let second = registry.insert(SharedMatch::new(BOB, ALICE).unwrap());
        assert_ne!(first, second);
        assert_eq!(2, registry.len());
        assert!(registry.get(first).is_some());

        assert!(registry.remove(first).is_some());
        assert!(registry.remove(first).is_none());
        assert!(registry.get(first).is_none());
        assert_eq!(1, registry.len());
        assert_eq!(2, registry.created());
    }

    #[test]
    fn board_marks() {
        let mut m = Match::new(ALICE, BOB).unwrap();
        assert_eq!("<@1>: \u{2753}\n<@2>: \u{2753}", board(&m));
        m.accept(BOB).unwrap();
        m.choose(BOB, Choice::Rock).unwrap();
        assert_eq!("<@1>: \u{2753}\n<@2>: \u{2705}", board(&m));
    }

    #[test]
    fn chosen() {
        assert_eq!("You chose \u{1FAA8} **Rock**!", chosen_message(Choice::Rock));
        assert_eq!("You chose \u{2702}\u{FE0F} **Scissors**!", chosen_message(Choice::Scissors));
    }

    #[test]
    fn result() {
        let mut m = Match::new(ALICE, BOB).unwrap();
        m.accept(ALICE).unwrap();
        m.choose(ALICE, Choice::Scissors).unwrap();
        m.choose(BOB, Choice::Paper).unwrap();
        match m.state() {
            MatchState::Resolved(ref result) => assert_eq!(
                "<@1> \u{2702}\u{FE0F} vs \u{1F4C4} <@2>\n\n## <@1> wins!", result_text(&m, result)),
            other => panic!("unexpected state: {:?}", other),
        }

        let mut m = Match::new(ALICE, BOB).unwrap();
        m.accept(ALICE).unwrap();
        m.choose(ALICE, Choice::Rock).unwrap();
        m.choose(BOB, Choice::Rock).unwrap();
        match m.state() {
            MatchState::Resolved(ref result) =>
                assert!(result_text(&m, result).ends_with("## It's a draw! \u{1F91D}")),
            other => panic!("unexpected state: {:?}", other),
        }
    }
}

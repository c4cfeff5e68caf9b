//! Single binary web server: the tournament engine behind a JSON API.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Set DATA_DIR to keep the tournament and its history on disk between runs.

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{DateTime, Utc};
use pasabolo_tournament::{
    apply, autocomplete_round, can_view_next, can_view_previous, next_unscored, parse_roster,
    persist, restore, round_complete, standings, FileStore, Intent, MemoryStore, Participant,
    ParticipantId, Phase, ScoreCard, Standing, StateStore, TournamentError, TournamentState,
};
use rand::rngs::ThreadRng;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Live tournament plus the store it is mirrored to after every change.
struct AppInner {
    state: TournamentState,
    store: Box<dyn StateStore + Send + Sync>,
}

type AppState = Data<RwLock<AppInner>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// What presentation needs to draw the current screen.
#[derive(Serialize)]
struct TournamentView<'a> {
    state: &'a TournamentState,
    /// Results of the viewed phase, best first.
    standings: Vec<Standing>,
    current_player: Option<&'a Participant>,
    round_complete: bool,
    can_view_previous: bool,
    can_view_next: bool,
}

impl<'a> TournamentView<'a> {
    fn of(state: &'a TournamentState) -> Self {
        Self {
            state,
            standings: standings(state, state.viewed_phase),
            current_player: state
                .current_player_id
                .and_then(|id| state.participants.iter().find(|p| p.id == id)),
            round_complete: round_complete(state),
            can_view_previous: can_view_previous(state),
            can_view_next: can_view_next(state),
        }
    }
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
}

#[derive(Deserialize)]
struct ImportPlayersBody {
    text: String,
}

#[derive(Deserialize)]
struct StartPhaseBody {
    phase: Phase,
}

#[derive(Deserialize)]
struct QuotaBody {
    phase: Phase,
    quota: usize,
}

#[derive(Deserialize)]
struct SubmitScoreBody {
    participant_id: ParticipantId,
    scores: Vec<u32>,
}

/// Path segment: participant id (e.g. /api/players/{participant_id})
#[derive(Deserialize)]
struct PlayerPath {
    participant_id: ParticipantId,
}

/// Path segment: history item id (e.g. /api/history/{id}/load)
#[derive(Deserialize)]
struct HistoryPath {
    id: String,
}

fn bad_request(e: TournamentError) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

/// Run `change` on a copy of the live tournament. On success the copy becomes the
/// live tournament and is persisted; on rejection nothing changes.
fn transition<F>(state: &AppState, change: F) -> HttpResponse
where
    F: FnOnce(&mut TournamentState, &mut ThreadRng, DateTime<Utc>) -> Result<(), TournamentError>,
{
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let mut next = g.state.clone();
    if let Err(e) = change(&mut next, &mut rand::thread_rng(), Utc::now()) {
        log::debug!("Rejected: {}", e);
        return bad_request(e);
    }
    let inner = &mut *g;
    if let Err(e) = persist(inner.store.as_mut(), &inner.state, &next) {
        log::error!("Could not persist tournament: {}", e);
    }
    inner.state = next;
    HttpResponse::Ok().json(TournamentView::of(&inner.state))
}

/// Apply a single intent.
fn dispatch(state: &AppState, intent: Intent) -> HttpResponse {
    transition(state, |s, rng, now| apply(s, intent, rng, now))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "pasabolo-tournament",
    })
}

/// Current tournament as a view (state + standings of the viewed phase).
#[get("/api/tournament")]
async fn api_get_tournament(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    HttpResponse::Ok().json(TournamentView::of(&g.state))
}

/// Generic intent endpoint: `{"kind": "...", ...}`.
#[post("/api/intents")]
async fn api_intent(state: AppState, body: Json<Intent>) -> HttpResponse {
    dispatch(&state, body.into_inner())
}

/// Add a participant (Setup only).
#[post("/api/players")]
async fn api_add_player(state: AppState, body: Json<AddPlayerBody>) -> HttpResponse {
    dispatch(&state, Intent::AddParticipant { name: body.into_inner().name })
}

/// Add participants from pasted text, one or more per line (Setup only).
#[post("/api/players/import")]
async fn api_import_players(state: AppState, body: Json<ImportPlayersBody>) -> HttpResponse {
    let names = match parse_roster(&body.text) {
        Ok(names) => names,
        Err(e) => return bad_request(e),
    };
    dispatch(&state, Intent::BulkAddParticipants { names })
}

/// Rename a participant (Setup only).
#[put("/api/players/{participant_id}")]
async fn api_rename_player(state: AppState, path: Path<PlayerPath>, body: Json<AddPlayerBody>) -> HttpResponse {
    dispatch(
        &state,
        Intent::RenameParticipant {
            participant_id: path.participant_id,
            name: body.into_inner().name,
        },
    )
}

/// Remove a participant (Setup only).
#[delete("/api/players/{participant_id}")]
async fn api_remove_player(state: AppState, path: Path<PlayerPath>) -> HttpResponse {
    dispatch(
        &state,
        Intent::RemoveParticipant {
            participant_id: path.participant_id,
        },
    )
}

#[put("/api/config/start-phase")]
async fn api_set_start_phase(state: AppState, body: Json<StartPhaseBody>) -> HttpResponse {
    dispatch(&state, Intent::SetStartPhase { phase: body.phase })
}

#[put("/api/config/quota")]
async fn api_set_quota(state: AppState, body: Json<QuotaBody>) -> HttpResponse {
    dispatch(
        &state,
        Intent::SetRoundQuota {
            phase: body.phase,
            quota: body.quota,
        },
    )
}

/// Start the tournament (Setup -> start phase).
#[post("/api/start")]
async fn api_start(state: AppState) -> HttpResponse {
    dispatch(&state, Intent::StartTournament)
}

/// Submit a participant's 8 balls and pass the turn to the next unscored participant.
#[post("/api/scores")]
async fn api_submit_score(state: AppState, body: Json<SubmitScoreBody>) -> HttpResponse {
    let scores = match ScoreCard::new(&body.scores) {
        Ok(card) => card,
        Err(e) => return bad_request(e),
    };
    let participant_id = body.participant_id;
    transition(&state, |s, rng, now| {
        apply(s, Intent::SubmitScore { participant_id, scores }, rng, now)?;
        let next = next_unscored(s);
        apply(s, Intent::SetCurrentPlayer { participant_id: next }, rng, now)
    })
}

/// Fill the active round with random scores (for trying a bracket out).
#[post("/api/autocomplete")]
async fn api_autocomplete(state: AppState) -> HttpResponse {
    transition(&state, |s, rng, now| {
        for intent in autocomplete_round(s, rng) {
            apply(s, intent, rng, now)?;
        }
        Ok(())
    })
}

/// Advance to the next phase (or finish the tournament from the final).
#[post("/api/advance")]
async fn api_advance(state: AppState) -> HttpResponse {
    dispatch(&state, Intent::AdvancePhase)
}

#[post("/api/rounds/previous")]
async fn api_view_previous(state: AppState) -> HttpResponse {
    dispatch(&state, Intent::ViewPreviousRound)
}

#[post("/api/rounds/next")]
async fn api_view_next(state: AppState) -> HttpResponse {
    dispatch(&state, Intent::ViewNextRound)
}

/// Discard the live tournament; history is kept.
#[post("/api/reset")]
async fn api_reset(state: AppState) -> HttpResponse {
    dispatch(&state, Intent::ResetTournament)
}

#[get("/api/history")]
async fn api_get_history(state: AppState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    HttpResponse::Ok().json(&g.state.history)
}

/// Open a finished tournament for inspection.
#[post("/api/history/{id}/load")]
async fn api_load_from_history(state: AppState, path: Path<HistoryPath>) -> HttpResponse {
    dispatch(
        &state,
        Intent::LoadFromHistory {
            id: path.into_inner().id,
        },
    )
}

#[delete("/api/history")]
async fn api_clear_history(state: AppState) -> HttpResponse {
    dispatch(&state, Intent::ClearHistory)
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn open_store() -> std::io::Result<Box<dyn StateStore + Send + Sync>> {
    match std::env::var("DATA_DIR") {
        Ok(dir) => {
            log::info!("Persisting tournaments in {}", dir);
            let store = FileStore::open(dir).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            Ok(Box::new(store))
        }
        Err(_) => {
            log::info!("DATA_DIR not set, tournaments are kept in memory only");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);

    let store = open_store()?;
    let restored = restore(store.as_ref()).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    log::info!(
        "Restored tournament in {} with {} finished tournament(s) in history",
        restored.phase,
        restored.history.len()
    );
    let state = Data::new(RwLock::new(AppInner {
        state: restored,
        store,
    }));

    log::info!("Starting server at http://{}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_get_tournament)
            .service(api_intent)
            .service(api_import_players)
            .service(api_add_player)
            .service(api_rename_player)
            .service(api_remove_player)
            .service(api_set_start_phase)
            .service(api_set_quota)
            .service(api_start)
            .service(api_submit_score)
            .service(api_autocomplete)
            .service(api_advance)
            .service(api_view_previous)
            .service(api_view_next)
            .service(api_reset)
            .service(api_get_history)
            .service(api_load_from_history)
            .service(api_clear_history)
    })
    .bind(bind)?
    .run()
    .await
}

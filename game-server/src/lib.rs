use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use crate::coordinator::{CoordinatorError, CoordinatorResult, SessionCoordinator};
use game_types::{
    ArchiveRoundRequest, CreateSessionRequest, GameError, KickRequest, Principal, ReadyRequest,
    SettingsUpdate, SubmitWordRequest,
};

pub mod config;
pub mod coordinator;
pub mod identity;

type Reply = WithStatus<Json>;

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<u64>,
}

#[derive(Serialize)]
struct ErrorBody<'a, E: Serialize> {
    error: &'a E,
}

pub fn create_routes(
    coordinator: Arc<SessionCoordinator>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let coordinator_filter = warp::any().map(move || coordinator.clone());

    // Health check endpoint
    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let create_session = warp::path!("sessions")
        .and(warp::post())
        .and(identity::principal())
        .and(warp::body::json())
        .and(coordinator_filter.clone())
        .and_then(handle_create_session);

    let public_sessions = warp::path!("sessions" / "public")
        .and(warp::get())
        .and(coordinator_filter.clone())
        .and_then(handle_public_sessions);

    // Polling endpoint; also where lazy phase changes get persisted
    let snapshot = warp::path!("sessions" / String)
        .and(warp::get())
        .and(coordinator_filter.clone())
        .and_then(handle_snapshot);

    let join = warp::path!("sessions" / String / "join")
        .and(warp::post())
        .and(identity::principal())
        .and(coordinator_filter.clone())
        .and_then(handle_join);

    let leave = warp::path!("sessions" / String / "leave")
        .and(warp::post())
        .and(identity::principal())
        .and(coordinator_filter.clone())
        .and_then(handle_leave);

    let kick = warp::path!("sessions" / String / "kick")
        .and(warp::post())
        .and(identity::principal())
        .and(warp::body::json())
        .and(coordinator_filter.clone())
        .and_then(handle_kick);

    let ready = warp::path!("sessions" / String / "ready")
        .and(warp::post())
        .and(identity::principal())
        .and(warp::body::json())
        .and(coordinator_filter.clone())
        .and_then(handle_ready);

    let start = warp::path!("sessions" / String / "start")
        .and(warp::post())
        .and(identity::principal())
        .and(coordinator_filter.clone())
        .and_then(handle_start);

    let submit_word = warp::path!("sessions" / String / "words")
        .and(warp::post())
        .and(identity::principal())
        .and(warp::body::json())
        .and(coordinator_filter.clone())
        .and_then(handle_submit_word);

    let new_round = warp::path!("sessions" / String / "new-round")
        .and(warp::post())
        .and(identity::principal())
        .and(coordinator_filter.clone())
        .and_then(handle_new_round);

    let archive = warp::path!("sessions" / String / "archive")
        .and(warp::post())
        .and(identity::principal())
        .and(warp::body::json())
        .and(coordinator_filter.clone())
        .and_then(handle_archive);

    let settings = warp::path!("sessions" / String / "settings")
        .and(warp::patch())
        .and(identity::principal())
        .and(warp::body::json())
        .and(coordinator_filter.clone())
        .and_then(handle_settings);

    let history = warp::path!("history" / String)
        .and(warp::get())
        .and(warp::query::<HistoryQuery>())
        .and(coordinator_filter.clone())
        .and_then(handle_history);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec![
            "content-type",
            identity::USER_ID_HEADER,
            identity::DISPLAY_NAME_HEADER,
        ])
        .allow_methods(vec!["GET", "POST", "PATCH"]);

    health
        .or(create_session)
        .or(public_sessions)
        .or(snapshot)
        .or(join)
        .or(leave)
        .or(kick)
        .or(ready)
        .or(start)
        .or(submit_word)
        .or(new_round)
        .or(archive)
        .or(settings)
        .or(history)
        .with(cors)
        .with(warp::log("word_hunt"))
}

/// Join codes are case-insensitive for the people typing them.
fn join_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn status_for(reason: &GameError) -> StatusCode {
    match reason {
        GameError::SessionNotFound { .. } | GameError::PlayerNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        GameError::NotHost | GameError::CannotKickHost | GameError::CannotKickSelf => {
            StatusCode::FORBIDDEN
        }
        GameError::CapacityExceeded { .. }
        | GameError::WrongPhase { .. }
        | GameError::GameNotActive
        | GameError::AlreadyFound { .. } => StatusCode::CONFLICT,
        GameError::TooShort { .. }
        | GameError::NotInDictionary { .. }
        | GameError::InvalidSettings { .. } => StatusCode::BAD_REQUEST,
    }
}

fn respond<T: Serialize>(result: CoordinatorResult<T>, success: StatusCode) -> Reply {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), success),
        Err(CoordinatorError::Rejected(reason)) => {
            debug!("Request rejected: {}", reason);
            warp::reply::with_status(
                warp::reply::json(&ErrorBody { error: &reason }),
                status_for(&reason),
            )
        }
        Err(CoordinatorError::Unavailable(_)) => warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": { "code": "Unavailable", "message": "Service temporarily unavailable" }
            })),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
    }
}

fn ok<T: Serialize>(result: CoordinatorResult<T>) -> Reply {
    respond(result, StatusCode::OK)
}

fn unauthorized() -> Reply {
    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": {
                "code": "Unauthenticated",
                "message": format!("missing {} header", identity::USER_ID_HEADER)
            }
        })),
        StatusCode::UNAUTHORIZED,
    )
}

async fn handle_create_session(
    principal: Option<Principal>,
    request: CreateSessionRequest,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let Some(principal) = principal else {
        return Ok(unauthorized());
    };
    Ok(respond(
        coordinator.create_session(&principal, request).await,
        StatusCode::CREATED,
    ))
}

async fn handle_public_sessions(
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    Ok(ok(coordinator.list_public_sessions().await))
}

async fn handle_snapshot(
    session_id: String,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    Ok(ok(coordinator.snapshot(&join_code(&session_id)).await))
}

async fn handle_join(
    session_id: String,
    principal: Option<Principal>,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let Some(principal) = principal else {
        return Ok(unauthorized());
    };
    Ok(ok(coordinator.join(&join_code(&session_id), &principal).await))
}

async fn handle_leave(
    session_id: String,
    principal: Option<Principal>,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let Some(principal) = principal else {
        return Ok(unauthorized());
    };
    Ok(ok(coordinator
        .leave(&join_code(&session_id), &principal.user_id)
        .await))
}

async fn handle_kick(
    session_id: String,
    principal: Option<Principal>,
    request: KickRequest,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let Some(principal) = principal else {
        return Ok(unauthorized());
    };
    Ok(ok(coordinator
        .kick(&join_code(&session_id), &principal.user_id, &request.user_id)
        .await))
}

async fn handle_ready(
    session_id: String,
    principal: Option<Principal>,
    request: ReadyRequest,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let Some(principal) = principal else {
        return Ok(unauthorized());
    };
    Ok(ok(coordinator
        .set_ready(&join_code(&session_id), &principal.user_id, request.ready)
        .await))
}

async fn handle_start(
    session_id: String,
    principal: Option<Principal>,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let Some(principal) = principal else {
        return Ok(unauthorized());
    };
    Ok(ok(coordinator
        .start(&join_code(&session_id), &principal.user_id)
        .await))
}

async fn handle_submit_word(
    session_id: String,
    principal: Option<Principal>,
    request: SubmitWordRequest,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let Some(principal) = principal else {
        return Ok(unauthorized());
    };
    Ok(ok(coordinator
        .submit_word(&join_code(&session_id), &principal.user_id, &request.word)
        .await))
}

async fn handle_new_round(
    session_id: String,
    principal: Option<Principal>,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let Some(principal) = principal else {
        return Ok(unauthorized());
    };
    Ok(ok(coordinator
        .new_round(&join_code(&session_id), &principal.user_id)
        .await))
}

async fn handle_archive(
    session_id: String,
    principal: Option<Principal>,
    request: ArchiveRoundRequest,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let Some(principal) = principal else {
        return Ok(unauthorized());
    };
    Ok(respond(
        coordinator
            .archive_round(&join_code(&session_id), &principal.user_id, request)
            .await,
        StatusCode::CREATED,
    ))
}

async fn handle_settings(
    session_id: String,
    principal: Option<Principal>,
    update: SettingsUpdate,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let Some(principal) = principal else {
        return Ok(unauthorized());
    };
    Ok(ok(coordinator
        .update_settings(&join_code(&session_id), &principal.user_id, update)
        .await))
}

async fn handle_history(
    user_id: String,
    query: HistoryQuery,
    coordinator: Arc<SessionCoordinator>,
) -> Result<Reply, warp::Rejection> {
    let limit = query.limit.unwrap_or(20).min(100); // Default 20, max 100
    Ok(ok(coordinator.score_history(&user_id, limit).await))
}

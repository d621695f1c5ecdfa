use crate::dtos::{
    AnalyticsQuery, MoodAnalyticsResponse, QuickMoodRequest, QuickMoodResponse,
    SaveSessionRequest, SessionDetailResponse, SessionResponse, UserSessionsQuery,
    UserSessionsResponse,
};
use crate::startup::AppState;
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use service_core::error::AppError;

fn bad_json(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(
        "Invalid JSON body: {}",
        rejection.body_text()
    ))
}

fn bad_query(rejection: QueryRejection) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(
        "Invalid query parameters: {}",
        rejection.body_text()
    ))
}

/// POST /api/session/save
pub async fn save_session(
    State(state): State<AppState>,
    payload: Result<Json<SaveSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(bad_json)?;

    let saved = state.sessions.save_session(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new(saved.session, saved.total_processing_time)),
    ))
}

/// GET /api/session/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDetailResponse>, AppError> {
    let session = state.sessions.get_session(&session_id).await?;
    Ok(Json(SessionDetailResponse::from(session)))
}

/// GET /api/session/user/:user_id
pub async fn get_user_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<UserSessionsQuery>, QueryRejection>,
) -> Result<Json<UserSessionsResponse>, AppError> {
    let Query(params) = query.map_err(bad_query)?;

    let (page, limit, skip) = state
        .sessions
        .list_user_sessions(&user_id, params.limit, params.skip)
        .await?;

    Ok(Json(UserSessionsResponse::new(page, limit, skip)))
}

/// GET /api/session/analytics/:user_id
pub async fn mood_analytics(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<Json<MoodAnalyticsResponse>, AppError> {
    let Query(params) = query.map_err(bad_query)?;

    let (days, aggregate) = state.sessions.mood_analytics(&user_id, params.days).await?;

    Ok(Json(MoodAnalyticsResponse::new(days, aggregate)))
}

/// POST /api/session/quick-mood
pub async fn quick_mood(
    State(state): State<AppState>,
    payload: Result<Json<QuickMoodRequest>, JsonRejection>,
) -> Result<Json<QuickMoodResponse>, AppError> {
    let Json(request) = payload.map_err(bad_json)?;
    Ok(Json(state.sessions.quick_mood(request).await?))
}

//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{Local, NaiveDate};
use tracing::{debug, warn};

use crate::domain::parse_gtfs_date;
use crate::error::QueryError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/feed", get(feed))
        .route("/trips", get(trips_on_date))
        .route("/trips/:id", get(trip_detail))
        .route("/shapes/:id", get(shape))
        .route("/stops", get(search_stops))
        .route("/stops/:id/board", get(station_board))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Feed metadata of the published schedule.
async fn feed(State(state): State<AppState>) -> Result<Json<FeedResponse>, AppError> {
    let model = state.schedule().await?;
    Ok(Json(FeedResponse::from(model.as_ref())))
}

/// Trips running on a service date.
async fn trips_on_date(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<TripsResponse>, AppError> {
    let date = service_date(query.date.as_deref())?;
    let model = state.schedule().await?;
    let trips = model
        .trips_for_date(date)
        .into_iter()
        .map(|t| TripResult::new(&model, t))
        .collect();
    Ok(Json(TripsResponse {
        date: date.to_string(),
        trips,
    }))
}

/// One trip with its calls.
async fn trip_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TripDetailResponse>, AppError> {
    let model = state.schedule().await?;
    let trip = model.trip(&id)?;
    let calls = model
        .stops_for_trip(&id)?
        .into_iter()
        .map(|(stop, stop_time)| CallResult::new(stop, stop_time))
        .collect();
    Ok(Json(TripDetailResponse {
        trip: TripResult::new(&model, trip),
        shape_id: trip.shape_id.clone(),
        calls,
    }))
}

async fn shape(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ShapeResponse>, AppError> {
    let model = state.schedule().await?;
    let points = model.shape(&id)?.iter().map(ShapePointResult::from).collect();
    Ok(Json(ShapeResponse {
        shape_id: id,
        points,
    }))
}

/// Stops whose name contains `name`.
async fn search_stops(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<StopsResponse>, AppError> {
    let model = state.schedule().await?;
    let stops = model
        .stops_matching_name(query.name.as_deref().unwrap_or_default())?
        .into_iter()
        .map(StopResult::from)
        .collect();
    Ok(Json(StopsResponse { stops }))
}

/// Departures at a stop, or at every platform of a station.
///
/// The stop may be given by id or by a name fragment matching one stop.
async fn station_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<BoardResponse>, AppError> {
    let date = service_date(query.date.as_deref())?;
    let model = state.schedule().await?;
    let stop = model.resolve_stop(&id)?;
    let calls = model
        .station_board(&stop.id, date)?
        .iter()
        .map(|entry| BoardCall::new(entry, date))
        .collect();
    Ok(Json(BoardResponse {
        stop: StopResult::from(stop),
        date: date.to_string(),
        calls,
    }))
}

/// Parse a `YYYYMMDD` or `YYYY-MM-DD` date, today if absent.
fn service_date(raw: Option<&str>) -> Result<NaiveDate, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Local::now().date_naive());
    };
    parse_gtfs_date(raw)
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .ok_or_else(|| AppError::BadRequest {
            message: format!("invalid date {raw:?}: expected YYYYMMDD or YYYY-MM-DD"),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Unavailable { message: String },
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::NotFound { .. } => AppError::NotFound {
                message: e.to_string(),
            },
            QueryError::AmbiguousName { .. } | QueryError::EmptyQuery => AppError::BadRequest {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        if status.is_server_error() {
            warn!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{ShapePoint, Stop, StopTime, Trip};
use crate::schedule::{BoardEntry, FeedCounts, GtfsData};

/// Query with an optional service date (`YYYYMMDD` or `YYYY-MM-DD`).
#[derive(Debug, Deserialize)]
pub struct DateQuery {
    /// Defaults to today
    pub date: Option<String>,
}

/// Stop name search.
#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

/// Feed metadata and sizes.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub publisher: Option<String>,
    pub publisher_url: Option<String>,
    pub language: Option<String>,
    pub version: Option<String>,
    /// First day the feed covers
    pub start_date: Option<String>,
    /// Last day the feed covers
    pub end_date: Option<String>,
    /// RFC 3339 time the schedule was loaded
    pub loaded_at: String,
    pub counts: FeedCounts,
}

impl From<&GtfsData> for FeedResponse {
    fn from(model: &GtfsData) -> Self {
        let info = model.feed_info();
        Self {
            publisher: info.map(|i| i.publisher.clone()),
            publisher_url: info.map(|i| i.publisher_url.clone()),
            language: info.map(|i| i.language.clone()),
            version: info.and_then(|i| i.version.clone()),
            start_date: info.and_then(|i| i.days).map(|d| d.start().to_string()),
            end_date: info.and_then(|i| i.days).map(|d| d.end().to_string()),
            loaded_at: model.loaded_at().to_rfc3339(),
            counts: model.counts(),
        }
    }
}

/// A trip in listings.
#[derive(Debug, Serialize)]
pub struct TripResult {
    pub trip_id: String,
    pub route_id: String,
    /// Route short name, or long name when there is none
    pub route_name: String,
    pub service_id: String,
    pub headsign: Option<String>,
    pub direction: Option<String>,
}

impl TripResult {
    pub fn new(model: &GtfsData, trip: &Trip) -> Self {
        Self {
            trip_id: trip.id.clone(),
            route_id: trip.route_id.clone(),
            route_name: model
                .route(&trip.route_id)
                .map(|r| r.display_name().to_string())
                .unwrap_or_default(),
            service_id: trip.service_id.clone(),
            headsign: trip.headsign.clone(),
            direction: trip.direction.map(|d| d.to_string()),
        }
    }
}

/// Trips running on a date.
#[derive(Debug, Serialize)]
pub struct TripsResponse {
    pub date: String,
    pub trips: Vec<TripResult>,
}

/// A calling point of a trip.
#[derive(Debug, Serialize)]
pub struct CallResult {
    pub sequence: u32,
    pub stop_id: String,
    pub stop_name: String,
    /// `HH:MM:SS`, hours may exceed 23
    pub arrival: String,
    pub departure: String,
    pub pickup: String,
    pub drop_off: String,
    pub timepoint: bool,
}

impl CallResult {
    pub fn new(stop: &Stop, stop_time: &StopTime) -> Self {
        Self {
            sequence: stop_time.sequence,
            stop_id: stop.id.clone(),
            stop_name: stop.name.clone(),
            arrival: stop_time.arrival.to_string(),
            departure: stop_time.departure.to_string(),
            pickup: stop_time.pickup.to_string(),
            drop_off: stop_time.drop_off.to_string(),
            timepoint: stop_time.timepoint,
        }
    }
}

/// A trip with its calls in order.
#[derive(Debug, Serialize)]
pub struct TripDetailResponse {
    #[serde(flatten)]
    pub trip: TripResult,
    pub shape_id: Option<String>,
    pub calls: Vec<CallResult>,
}

/// A stop or station.
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub stop_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: String,
    pub parent_station: Option<String>,
}

impl From<&Stop> for StopResult {
    fn from(stop: &Stop) -> Self {
        Self {
            stop_id: stop.id.clone(),
            name: stop.name.clone(),
            latitude: stop.point.latitude(),
            longitude: stop.point.longitude(),
            location_type: stop.location_type.to_string(),
            parent_station: stop.parent.clone(),
        }
    }
}

/// Stops matching a name.
#[derive(Debug, Serialize)]
pub struct StopsResponse {
    pub stops: Vec<StopResult>,
}

/// One vertex of a shape.
#[derive(Debug, Serialize)]
pub struct ShapePointResult {
    pub sequence: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub distance: Option<f64>,
}

impl From<&ShapePoint> for ShapePointResult {
    fn from(point: &ShapePoint) -> Self {
        Self {
            sequence: point.sequence,
            latitude: point.point.latitude(),
            longitude: point.point.longitude(),
            distance: point.distance,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShapeResponse {
    pub shape_id: String,
    pub points: Vec<ShapePointResult>,
}

/// A call on a station board.
#[derive(Debug, Serialize)]
pub struct BoardCall {
    pub trip_id: String,
    pub route_name: String,
    pub headsign: Option<String>,
    /// The platform or stop the trip calls at
    pub stop_id: String,
    pub arrival: String,
    pub departure: String,
    /// Civil date and time of the departure, past midnight for late trips
    pub departs_at: String,
}

/// Calls at a stop on a date.
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub stop: StopResult,
    pub date: String,
    pub calls: Vec<BoardCall>,
}

impl BoardCall {
    pub fn new(entry: &BoardEntry<'_>, date: chrono::NaiveDate) -> Self {
        Self {
            trip_id: entry.trip.id.clone(),
            route_name: entry.route.display_name().to_string(),
            headsign: entry
                .stop_time
                .headsign
                .clone()
                .or_else(|| entry.trip.headsign.clone()),
            stop_id: entry.stop_time.stop_id.clone(),
            arrival: entry.stop_time.arrival.to_string(),
            departure: entry.stop_time.departure.to_string(),
            departs_at: entry
                .stop_time
                .departure
                .on_date(date)
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

//! Schedule records, one type per GTFS table.
//!
//! Records refer to each other by id; the ids are resolved against the
//! owning maps in [`GtfsData`](crate::schedule::GtfsData) when the schedule is
//! loaded, so a record taken from a loaded schedule never holds a dangling
//! reference.

use chrono::NaiveDate;

use super::{
    DayRange, DayTime, Direction, ExceptionType, LocationType, PickupDropOff, Point, RouteType,
    WeekPattern,
};

/// A transit agency (`agency.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct Agency {
    /// Empty only when the feed has a single agency and leaves the id out.
    pub id: String,
    pub name: String,
    pub url: String,
    /// IANA zone name; all times of the agency's trips are local to it.
    pub timezone: String,
}

/// A group of trips shown to riders as one service (`routes.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub id: String,
    pub agency_id: String,
    pub short_name: String,
    pub long_name: String,
    pub route_type: RouteType,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Six hex digits, no leading `#`.
    pub color: Option<String>,
    pub text_color: Option<String>,
}

impl Route {
    /// The short name if present, else the long name.
    pub fn display_name(&self) -> &str {
        if self.short_name.is_empty() {
            &self.long_name
        } else {
            &self.short_name
        }
    }
}

/// A stop, station or other location (`stops.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: String,
    pub code: Option<String>,
    pub name: String,
    pub point: Point,
    /// Parent station id.
    pub parent: Option<String>,
    pub location_type: LocationType,
    pub zone: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

/// One run of a vehicle along a route (`trips.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub shape_id: Option<String>,
    pub headsign: Option<String>,
    pub short_name: Option<String>,
    pub block_id: Option<String>,
    pub direction: Option<Direction>,
}

/// A scheduled call of a trip at a stop (`stop_times.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub sequence: u32,
    pub arrival: DayTime,
    pub departure: DayTime,
    pub pickup: PickupDropOff,
    pub drop_off: PickupDropOff,
    pub headsign: Option<String>,
    /// False when the times are approximate.
    pub timepoint: bool,
    pub distance: Option<f64>,
}

impl StopTime {
    /// Seconds the vehicle stands at the stop.
    pub fn dwell_secs(&self) -> u32 {
        self.departure.as_secs().saturating_sub(self.arrival.as_secs())
    }
}

/// Weekly service pattern with its validity window (`calendar.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    pub service_id: String,
    pub week: WeekPattern,
    pub days: DayRange,
}

/// A single-date override of a service (`calendar_dates.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarException {
    pub service_id: String,
    pub date: NaiveDate,
    pub kind: ExceptionType,
}

/// One vertex of a shape polyline (`shapes.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePoint {
    pub shape_id: String,
    pub sequence: u32,
    pub point: Point,
    /// Cumulative distance along the shape, in feed units.
    pub distance: Option<f64>,
}

/// Publisher and version metadata of a feed (`feed_info.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct FeedInfo {
    pub publisher: String,
    pub publisher_url: String,
    pub language: String,
    pub days: Option<DayRange>,
    pub version: Option<String>,
    pub contact_email: Option<String>,
}

//! The loaded schedule and its query surface.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};

use crate::calendar::ServiceCalendar;
use crate::domain::{
    Agency, Calendar, CalendarException, FeedInfo, LocationType, Route, ShapePoint, Stop,
    StopTime, Trip,
};
use crate::error::QueryError;
use crate::resolve::Resolved;

/// Row counts of a loaded schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct FeedCounts {
    pub agencies: usize,
    pub routes: usize,
    pub stops: usize,
    pub trips: usize,
    pub stop_times: usize,
    pub services: usize,
    pub shapes: usize,
}

/// A call on a station board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardEntry<'a> {
    pub trip: &'a Trip,
    pub route: &'a Route,
    pub stop_time: &'a StopTime,
}

/// A fully resolved, immutable GTFS schedule.
///
/// Every foreign key in a `GtfsData` resolves and every service's active
/// dates are precomputed. The model is never changed after it is built; a
/// newer feed produces a new `GtfsData`.
#[derive(Debug)]
pub struct GtfsData {
    agencies: HashMap<String, Agency>,
    routes: HashMap<String, Route>,
    stops: HashMap<String, Stop>,
    trips: HashMap<String, Trip>,
    stop_times: HashMap<String, Vec<StopTime>>,
    shapes: HashMap<String, Vec<ShapePoint>>,
    route_trips: HashMap<String, Vec<String>>,
    stop_trips: HashMap<String, Vec<String>>,
    children: HashMap<String, Vec<String>>,
    calendar: ServiceCalendar,
    feed_info: Option<FeedInfo>,
    loaded_at: DateTime<Utc>,
}

impl GtfsData {
    pub(crate) fn new(resolved: Resolved, loaded_at: DateTime<Utc>) -> Self {
        let Resolved {
            agencies,
            routes,
            stops,
            trips,
            stop_times,
            shapes,
            route_trips,
            stop_trips,
            children,
            calendars,
            exceptions,
            feed_info,
        } = resolved;
        Self {
            agencies,
            routes,
            stops,
            trips,
            stop_times,
            shapes,
            route_trips,
            stop_trips,
            children,
            calendar: ServiceCalendar::resolve(calendars, exceptions),
            feed_info,
            loaded_at,
        }
    }

    /// When this model was built.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn feed_info(&self) -> Option<&FeedInfo> {
        self.feed_info.as_ref()
    }

    /// The `feed_info.txt` version, if the feed declares one.
    pub fn feed_version(&self) -> Option<&str> {
        self.feed_info.as_ref()?.version.as_deref()
    }

    pub fn counts(&self) -> FeedCounts {
        FeedCounts {
            agencies: self.agencies.len(),
            routes: self.routes.len(),
            stops: self.stops.len(),
            trips: self.trips.len(),
            stop_times: self.stop_times.values().map(Vec::len).sum(),
            services: self.calendar.service_count(),
            shapes: self.shapes.len(),
        }
    }

    pub fn agency(&self, id: &str) -> Result<&Agency, QueryError> {
        self.agencies
            .get(id)
            .ok_or_else(|| QueryError::not_found("agency", id))
    }

    pub fn route(&self, id: &str) -> Result<&Route, QueryError> {
        self.routes
            .get(id)
            .ok_or_else(|| QueryError::not_found("route", id))
    }

    pub fn stop(&self, id: &str) -> Result<&Stop, QueryError> {
        self.stops
            .get(id)
            .ok_or_else(|| QueryError::not_found("stop", id))
    }

    pub fn trip(&self, id: &str) -> Result<&Trip, QueryError> {
        self.trips
            .get(id)
            .ok_or_else(|| QueryError::not_found("trip", id))
    }

    /// All agencies, by id.
    pub fn agencies(&self) -> Vec<&Agency> {
        let mut all: Vec<_> = self.agencies.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// All routes, by id.
    pub fn routes(&self) -> Vec<&Route> {
        let mut all: Vec<_> = self.routes.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// A trip's calls paired with their stops, by ascending stop sequence.
    pub fn stops_for_trip(&self, trip_id: &str) -> Result<Vec<(&Stop, &StopTime)>, QueryError> {
        self.trip(trip_id)?;
        let Some(calls) = self.stop_times.get(trip_id) else {
            return Ok(Vec::new());
        };
        calls
            .iter()
            .map(|st| -> Result<_, QueryError> { Ok((self.stop(&st.stop_id)?, st)) })
            .collect()
    }

    /// A shape's points, by ascending sequence.
    pub fn shape(&self, shape_id: &str) -> Result<&[ShapePoint], QueryError> {
        self.shapes
            .get(shape_id)
            .map(Vec::as_slice)
            .ok_or_else(|| QueryError::not_found("shape", shape_id))
    }

    /// Trips of a route, by trip id.
    pub fn trips_for_route(&self, route_id: &str) -> Result<Vec<&Trip>, QueryError> {
        self.route(route_id)?;
        Ok(self
            .route_trips
            .get(route_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.trips.get(id))
            .collect())
    }

    /// Trips whose service runs on the date, by trip id.
    pub fn trips_for_date(&self, date: NaiveDate) -> Vec<&Trip> {
        let mut trips: Vec<&Trip> = self
            .trips
            .values()
            .filter(|t| self.calendar.is_active(&t.service_id, date))
            .collect();
        trips.sort_by(|a, b| a.id.cmp(&b.id));
        trips
    }

    /// Calls at a stop on a service date, by departure time then trip id.
    ///
    /// For a station the calls at its child stops are included.
    pub fn station_board(
        &self,
        stop_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<BoardEntry<'_>>, QueryError> {
        let stop = self.stop(stop_id)?;
        let mut stop_ids: HashSet<&str> = HashSet::from([stop.id.as_str()]);
        if stop.location_type == LocationType::Station {
            stop_ids.extend(self.child_stops(stop_id).into_iter().map(|s| s.id.as_str()));
        }

        let trip_ids: HashSet<&str> = stop_ids
            .iter()
            .filter_map(|id| self.stop_trips.get(*id))
            .flatten()
            .map(String::as_str)
            .collect();

        let mut board = Vec::new();
        for trip_id in trip_ids {
            let Some(trip) = self.trips.get(trip_id) else {
                continue;
            };
            if !self.calendar.is_active(&trip.service_id, date) {
                continue;
            }
            let Some(route) = self.routes.get(&trip.route_id) else {
                continue;
            };
            let calls = self.stop_times.get(trip_id).into_iter().flatten();
            for stop_time in calls.filter(|st| stop_ids.contains(st.stop_id.as_str())) {
                board.push(BoardEntry {
                    trip,
                    route,
                    stop_time,
                });
            }
        }
        board.sort_by(|a, b| {
            (a.stop_time.departure, &a.trip.id, a.stop_time.sequence).cmp(&(
                b.stop_time.departure,
                &b.trip.id,
                b.stop_time.sequence,
            ))
        });
        Ok(board)
    }

    /// Child stops of a station, by id.
    pub fn child_stops(&self, station_id: &str) -> Vec<&Stop> {
        self.children
            .get(station_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.stops.get(id))
            .collect()
    }

    /// Find one stop by exact id, else by a name fragment that matches a
    /// single stop.
    ///
    /// Matching is case-insensitive. A fragment matching several stops is
    /// `AmbiguousName`, listing `id/name` of each match.
    pub fn resolve_stop(&self, query: &str) -> Result<&Stop, QueryError> {
        let query = query.trim();
        if let Some(stop) = self.stops.get(query) {
            return Ok(stop);
        }
        let mut matches = self.stops_matching_name(query)?;
        match matches.len() {
            0 => Err(QueryError::not_found("stop", query)),
            1 => Ok(matches.remove(0)),
            _ => Err(QueryError::AmbiguousName {
                query: query.to_string(),
                matches: matches
                    .iter()
                    .map(|s| format!("{}/{}", s.id, s.name))
                    .collect(),
            }),
        }
    }

    /// Stops whose name contains the fragment, ignoring case, by name then id.
    ///
    /// This is a linear scan of all stops.
    pub fn stops_matching_name(&self, fragment: &str) -> Result<Vec<&Stop>, QueryError> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        let mut found: Vec<&Stop> = self
            .stops
            .values()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    pub fn is_service_active(&self, service_id: &str, date: NaiveDate) -> bool {
        self.calendar.is_active(service_id, date)
    }

    /// Service ids running on the date, sorted.
    pub fn services_on(&self, date: NaiveDate) -> Vec<&str> {
        self.calendar.services_on(date)
    }

    /// Dates a service runs on, ascending.
    pub fn active_dates(&self, service_id: &str) -> Result<Vec<NaiveDate>, QueryError> {
        self.calendar
            .active_dates(service_id)
            .ok_or_else(|| QueryError::not_found("service", service_id))
    }

    pub fn calendar(&self, service_id: &str) -> Option<&Calendar> {
        self.calendar.calendar(service_id)
    }

    pub fn exceptions(&self, service_id: &str) -> &[CalendarException] {
        self.calendar.exceptions(service_id)
    }
}

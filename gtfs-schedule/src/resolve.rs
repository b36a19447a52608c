//! Reference resolver.
//!
//! Checks every foreign key against the table it points into and builds the
//! reverse indices the schedule queries use. Stop times and shape points are
//! grouped by owner and ordered by sequence here, which is also where the
//! time and distance progressions are checked.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::build::Tables;
use crate::domain::{
    Agency, Calendar, CalendarException, FeedInfo, Route, ShapePoint, Stop, StopTime, Trip,
};
use crate::error::LoadError;

/// Cross-referenced records with their reverse indices.
#[derive(Debug)]
pub struct Resolved {
    pub agencies: HashMap<String, Agency>,
    pub routes: HashMap<String, Route>,
    pub stops: HashMap<String, Stop>,
    pub trips: HashMap<String, Trip>,
    /// Trip id to its stop times, by ascending sequence.
    pub stop_times: HashMap<String, Vec<StopTime>>,
    /// Shape id to its points, by ascending sequence.
    pub shapes: HashMap<String, Vec<ShapePoint>>,
    /// Route id to its trip ids, sorted.
    pub route_trips: HashMap<String, Vec<String>>,
    /// Stop id to the ids of trips calling there, sorted.
    pub stop_trips: HashMap<String, Vec<String>>,
    /// Station id to its child stop ids, sorted.
    pub children: HashMap<String, Vec<String>>,
    pub calendars: HashMap<String, Calendar>,
    pub exceptions: Vec<CalendarException>,
    pub feed_info: Option<FeedInfo>,
}

fn dangling(
    table: &'static str,
    id: &str,
    field: &'static str,
    target: &'static str,
    target_id: &str,
) -> LoadError {
    LoadError::DanglingReference {
        table,
        id: id.to_string(),
        field,
        target,
        target_id: target_id.to_string(),
    }
}

fn invalid_sequence(table: &'static str, id: &str, reason: String) -> LoadError {
    LoadError::InvalidSequence {
        table,
        id: id.to_string(),
        reason,
    }
}

/// Entries of `map` in ascending id order, so the first error reported
/// does not depend on hash order.
fn by_id<V>(map: &HashMap<String, V>) -> Vec<(&String, &V)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Resolve all references of a set of freshly built tables.
pub fn resolve(tables: Tables) -> Result<Resolved, LoadError> {
    let Tables {
        agencies,
        routes,
        stops,
        trips,
        stop_times,
        calendars,
        exceptions,
        shape_points,
        feed_info,
    } = tables;

    for (_, route) in by_id(&routes) {
        if !agencies.contains_key(&route.agency_id) {
            return Err(dangling(
                "routes.txt",
                &route.id,
                "agency_id",
                "agency.txt",
                &route.agency_id,
            ));
        }
    }

    let children = check_stations(&stops)?;
    let shapes = group_shapes(shape_points)?;

    let services: HashSet<&str> = calendars
        .keys()
        .map(String::as_str)
        .chain(exceptions.iter().map(|e| e.service_id.as_str()))
        .collect();
    let mut route_trips: HashMap<String, Vec<String>> = HashMap::new();
    for (_, trip) in by_id(&trips) {
        if !routes.contains_key(&trip.route_id) {
            return Err(dangling(
                "trips.txt",
                &trip.id,
                "route_id",
                "routes.txt",
                &trip.route_id,
            ));
        }
        if !services.contains(trip.service_id.as_str()) {
            return Err(dangling(
                "trips.txt",
                &trip.id,
                "service_id",
                "calendar.txt",
                &trip.service_id,
            ));
        }
        if let Some(shape_id) = &trip.shape_id
            && !shapes.contains_key(shape_id)
        {
            return Err(dangling(
                "trips.txt",
                &trip.id,
                "shape_id",
                "shapes.txt",
                shape_id,
            ));
        }
        route_trips
            .entry(trip.route_id.clone())
            .or_default()
            .push(trip.id.clone());
    }

    let mut by_trip: HashMap<String, Vec<StopTime>> = HashMap::new();
    let mut stop_trips: HashMap<String, Vec<String>> = HashMap::new();
    for st in stop_times {
        if !trips.contains_key(&st.trip_id) {
            return Err(dangling(
                "stop_times.txt",
                &format!("{}#{}", st.trip_id, st.sequence),
                "trip_id",
                "trips.txt",
                &st.trip_id,
            ));
        }
        if !stops.contains_key(&st.stop_id) {
            return Err(dangling(
                "stop_times.txt",
                &format!("{}#{}", st.trip_id, st.sequence),
                "stop_id",
                "stops.txt",
                &st.stop_id,
            ));
        }
        stop_trips
            .entry(st.stop_id.clone())
            .or_default()
            .push(st.trip_id.clone());
        by_trip.entry(st.trip_id.clone()).or_default().push(st);
    }
    for calls in by_trip.values_mut() {
        calls.sort_by_key(|st| st.sequence);
    }
    for (trip_id, calls) in by_id(&by_trip) {
        check_stop_times(trip_id, calls)?;
    }

    for ids in route_trips.values_mut().chain(stop_trips.values_mut()) {
        ids.sort_unstable();
        ids.dedup();
    }

    let idle = trips.len() - by_trip.len();
    if idle > 0 {
        warn!(trips = idle, "trips without stop times");
    }
    debug!(
        routes = route_trips.len(),
        served_stops = stop_trips.len(),
        shapes = shapes.len(),
        "resolved references"
    );

    Ok(Resolved {
        agencies,
        routes,
        stops,
        trips,
        stop_times: by_trip,
        shapes,
        route_trips,
        stop_trips,
        children,
        calendars,
        exceptions,
        feed_info,
    })
}

/// Check parent references and return the station to children index.
///
/// Parents may be listed after their children, so this runs over the
/// complete stop table.
fn check_stations(
    stops: &HashMap<String, Stop>,
) -> Result<HashMap<String, Vec<String>>, LoadError> {
    let mut children: HashMap<String, Vec<String>> = HashMap::new();
    for (_, stop) in by_id(stops) {
        let Some(parent) = &stop.parent else { continue };
        if !stops.contains_key(parent) {
            return Err(dangling(
                "stops.txt",
                &stop.id,
                "parent_station",
                "stops.txt",
                parent,
            ));
        }
        children
            .entry(parent.clone())
            .or_default()
            .push(stop.id.clone());
    }

    for (_, stop) in by_id(stops) {
        let mut seen = HashSet::from([stop.id.as_str()]);
        let mut current = stop;
        while let Some(parent_id) = &current.parent {
            if !seen.insert(parent_id.as_str()) {
                return Err(invalid_sequence(
                    "stops.txt",
                    &stop.id,
                    format!("parent_station chain loops back to {parent_id}"),
                ));
            }
            match stops.get(parent_id) {
                Some(parent) => current = parent,
                None => break,
            }
        }
    }

    for ids in children.values_mut() {
        ids.sort_unstable();
    }
    Ok(children)
}

/// Check the time progression of one trip's stop times, already sorted by
/// sequence.
fn check_stop_times(trip_id: &str, calls: &[StopTime]) -> Result<(), LoadError> {
    for st in calls {
        if st.arrival > st.departure {
            return Err(invalid_sequence(
                "stop_times.txt",
                trip_id,
                format!(
                    "stop {} arrives at {} after departing at {}",
                    st.sequence, st.arrival, st.departure
                ),
            ));
        }
    }
    for pair in calls.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if prev.departure > next.arrival {
            return Err(invalid_sequence(
                "stop_times.txt",
                trip_id,
                format!(
                    "stop {} arrives at {} before stop {} departs at {}",
                    next.sequence, next.arrival, prev.sequence, prev.departure
                ),
            ));
        }
        if let (Some(a), Some(b)) = (prev.distance, next.distance)
            && b < a
        {
            return Err(invalid_sequence(
                "stop_times.txt",
                trip_id,
                format!("shape_dist_traveled decreases at stop {}", next.sequence),
            ));
        }
    }
    Ok(())
}

/// Group shape points by shape, ordered by sequence, checking distances.
fn group_shapes(points: Vec<ShapePoint>) -> Result<HashMap<String, Vec<ShapePoint>>, LoadError> {
    let mut shapes: HashMap<String, Vec<ShapePoint>> = HashMap::new();
    for point in points {
        shapes.entry(point.shape_id.clone()).or_default().push(point);
    }
    for points in shapes.values_mut() {
        points.sort_by_key(|p| p.sequence);
    }
    for (shape_id, points) in by_id(&shapes) {
        for pair in points.windows(2) {
            if let (Some(a), Some(b)) = (pair[0].distance, pair[1].distance)
                && b < a
            {
                return Err(invalid_sequence(
                    "shapes.txt",
                    shape_id,
                    format!("shape_dist_traveled decreases at point {}", pair[1].sequence),
                ));
            }
        }
    }
    Ok(shapes)
}

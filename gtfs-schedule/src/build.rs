//! Entity builder: typed rows to domain records.
//!
//! Each table has a constructor that reads its fields from a [`Row`] and
//! validates codes, coordinates and date ranges. [`EntityBuilder`] collects
//! the records and rejects repeated primary keys instead of letting a later
//! row overwrite an earlier one.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{
    Agency, Calendar, CalendarException, DayRange, Direction, ExceptionType, FeedInfo,
    LocationType, PickupDropOff, Point, Route, RouteType, ShapePoint, Stop, StopTime, Trip,
    WeekPattern,
};
use crate::error::LoadError;
use crate::table::Row;
use crate::table::schema::{
    AGENCY, CALENDAR, CALENDAR_DATES, FEED_INFO, ROUTES, SHAPES, STOP_TIMES, STOPS, TRIPS,
};

/// Records of every table, before cross-referencing.
#[derive(Debug, Default)]
pub struct Tables {
    pub agencies: HashMap<String, Agency>,
    pub routes: HashMap<String, Route>,
    pub stops: HashMap<String, Stop>,
    pub trips: HashMap<String, Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendars: HashMap<String, Calendar>,
    pub exceptions: Vec<CalendarException>,
    pub shape_points: Vec<ShapePoint>,
    pub feed_info: Option<FeedInfo>,
}

/// Accumulates records row by row.
///
/// `agency.txt` rows must be added before `routes.txt` rows, since a route
/// without an `agency_id` takes the id of the feed's only agency.
#[derive(Debug, Default)]
pub struct EntityBuilder {
    tables: Tables,
    exception_keys: HashSet<(String, NaiveDate)>,
    shape_keys: HashSet<(String, u32)>,
    stop_time_keys: HashSet<(String, u32)>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the record for one row and add it to its table.
    pub fn add_row(&mut self, row: &Row) -> Result<(), LoadError> {
        match row.table() {
            f if f == AGENCY.file => self.add_agency(row),
            f if f == ROUTES.file => {
                let route = route(row, self.sole_agency_id())?;
                insert_unique(&mut self.tables.routes, ROUTES.file, route.id.clone(), route)
            }
            f if f == STOPS.file => {
                let stop = stop(row)?;
                insert_unique(&mut self.tables.stops, STOPS.file, stop.id.clone(), stop)
            }
            f if f == TRIPS.file => {
                let trip = trip(row)?;
                insert_unique(&mut self.tables.trips, TRIPS.file, trip.id.clone(), trip)
            }
            f if f == STOP_TIMES.file => {
                let st = stop_time(row)?;
                if !self.stop_time_keys.insert((st.trip_id.clone(), st.sequence)) {
                    return Err(LoadError::duplicate(
                        STOP_TIMES.file,
                        format!("{}#{}", st.trip_id, st.sequence),
                    ));
                }
                self.tables.stop_times.push(st);
                Ok(())
            }
            f if f == CALENDAR.file => {
                let cal = calendar(row)?;
                insert_unique(
                    &mut self.tables.calendars,
                    CALENDAR.file,
                    cal.service_id.clone(),
                    cal,
                )
            }
            f if f == CALENDAR_DATES.file => {
                let exc = calendar_exception(row)?;
                if !self.exception_keys.insert((exc.service_id.clone(), exc.date)) {
                    return Err(LoadError::duplicate(
                        CALENDAR_DATES.file,
                        format!("{}@{}", exc.service_id, exc.date.format("%Y%m%d")),
                    ));
                }
                self.tables.exceptions.push(exc);
                Ok(())
            }
            f if f == SHAPES.file => {
                let point = shape_point(row)?;
                if !self.shape_keys.insert((point.shape_id.clone(), point.sequence)) {
                    return Err(LoadError::duplicate(
                        SHAPES.file,
                        format!("{}#{}", point.shape_id, point.sequence),
                    ));
                }
                self.tables.shape_points.push(point);
                Ok(())
            }
            f if f == FEED_INFO.file => {
                if self.tables.feed_info.is_some() {
                    return Err(row.invalid("*", "feed_info.txt must have a single row"));
                }
                self.tables.feed_info = Some(feed_info(row)?);
                Ok(())
            }
            other => Err(LoadError::UnknownFile {
                file: other.to_string(),
            }),
        }
    }

    fn add_agency(&mut self, row: &Row) -> Result<(), LoadError> {
        let agency = agency(row)?;
        let agencies = &self.tables.agencies;
        if !agencies.is_empty() && (agency.id.is_empty() || agencies.contains_key("")) {
            return Err(row.invalid(
                "agency_id",
                "agency_id is required when the feed has more than one agency",
            ));
        }
        insert_unique(
            &mut self.tables.agencies,
            AGENCY.file,
            agency.id.clone(),
            agency,
        )
    }

    fn sole_agency_id(&self) -> Option<&str> {
        let mut ids = self.tables.agencies.keys();
        match (ids.next(), ids.next()) {
            (Some(id), None) => Some(id),
            _ => None,
        }
    }

    pub fn finish(self) -> Tables {
        let t = &self.tables;
        debug!(
            agencies = t.agencies.len(),
            routes = t.routes.len(),
            stops = t.stops.len(),
            trips = t.trips.len(),
            stop_times = t.stop_times.len(),
            calendars = t.calendars.len(),
            exceptions = t.exceptions.len(),
            shape_points = t.shape_points.len(),
            "built records"
        );
        self.tables
    }
}

fn insert_unique<T>(
    map: &mut HashMap<String, T>,
    table: &'static str,
    key: String,
    value: T,
) -> Result<(), LoadError> {
    match map.entry(key) {
        Entry::Occupied(e) => Err(LoadError::duplicate(table, e.key().clone())),
        Entry::Vacant(e) => {
            e.insert(value);
            Ok(())
        }
    }
}

fn code<T: TryFrom<u32, Error = crate::domain::InvalidCode>>(
    row: &Row,
    field: &str,
) -> Result<Option<T>, LoadError> {
    row.opt_integer(field)?
        .map(T::try_from)
        .transpose()
        .map_err(|e| row.invalid(field, e))
}

fn point(row: &Row, lat: &str, lon: &str) -> Result<Point, LoadError> {
    Point::new(row.float(lat)?, row.float(lon)?).map_err(|e| row.invalid(lat, e))
}

pub fn agency(row: &Row) -> Result<Agency, LoadError> {
    Ok(Agency {
        id: row.opt_text("agency_id")?.unwrap_or_default(),
        name: row.text("agency_name")?.to_string(),
        url: row.text("agency_url")?.to_string(),
        timezone: row.text("agency_timezone")?.to_string(),
    })
}

/// Build a route; `sole_agency` is used when the row has no `agency_id`.
pub fn route(row: &Row, sole_agency: Option<&str>) -> Result<Route, LoadError> {
    let agency_id = match (row.opt_text("agency_id")?, sole_agency) {
        (Some(id), _) => id,
        (None, Some(id)) => id.to_string(),
        (None, None) => {
            return Err(row.invalid(
                "agency_id",
                "agency_id is required when the feed has more than one agency",
            ));
        }
    };
    let short_name = row.opt_text("route_short_name")?.unwrap_or_default();
    let long_name = row.opt_text("route_long_name")?.unwrap_or_default();
    if short_name.is_empty() && long_name.is_empty() {
        return Err(row.invalid(
            "route_short_name",
            "one of route_short_name or route_long_name is required",
        ));
    }
    let route_type: RouteType = code(row, "route_type")?
        .ok_or_else(|| row.invalid("route_type", "required value is empty"))?;
    Ok(Route {
        id: row.text("route_id")?.to_string(),
        agency_id,
        short_name,
        long_name,
        route_type,
        description: row.opt_text("route_desc")?,
        url: row.opt_text("route_url")?,
        color: row.opt_text("route_color")?,
        text_color: row.opt_text("route_text_color")?,
    })
}

pub fn stop(row: &Row) -> Result<Stop, LoadError> {
    Ok(Stop {
        id: row.text("stop_id")?.to_string(),
        code: row.opt_text("stop_code")?,
        name: row.text("stop_name")?.to_string(),
        point: point(row, "stop_lat", "stop_lon")?,
        parent: row.opt_text("parent_station")?,
        location_type: code::<LocationType>(row, "location_type")?.unwrap_or_default(),
        zone: row.opt_text("zone_id")?,
        description: row.opt_text("stop_desc")?,
        url: row.opt_text("stop_url")?,
    })
}

pub fn trip(row: &Row) -> Result<Trip, LoadError> {
    Ok(Trip {
        id: row.text("trip_id")?.to_string(),
        route_id: row.text("route_id")?.to_string(),
        service_id: row.text("service_id")?.to_string(),
        shape_id: row.opt_text("shape_id")?,
        headsign: row.opt_text("trip_headsign")?,
        short_name: row.opt_text("trip_short_name")?,
        block_id: row.opt_text("block_id")?,
        direction: row.opt_flag("direction_id")?.map(Direction::from),
    })
}

pub fn stop_time(row: &Row) -> Result<StopTime, LoadError> {
    let distance = row.opt_float("shape_dist_traveled")?;
    if distance.is_some_and(|d| d < 0.0) {
        return Err(row.invalid("shape_dist_traveled", "distance must not be negative"));
    }
    Ok(StopTime {
        trip_id: row.text("trip_id")?.to_string(),
        stop_id: row.text("stop_id")?.to_string(),
        sequence: row.integer("stop_sequence")?,
        arrival: row.time("arrival_time")?,
        departure: row.time("departure_time")?,
        pickup: code::<PickupDropOff>(row, "pickup_type")?.unwrap_or_default(),
        drop_off: code::<PickupDropOff>(row, "drop_off_type")?.unwrap_or_default(),
        headsign: row.opt_text("stop_headsign")?,
        timepoint: row.opt_flag("timepoint")?.unwrap_or(true),
        distance,
    })
}

pub fn calendar(row: &Row) -> Result<Calendar, LoadError> {
    const DAYS: [&str; 7] = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];
    let mut flags = [false; 7];
    for (flag, day) in flags.iter_mut().zip(DAYS) {
        *flag = row.flag(day)?;
    }
    let days = DayRange::new(row.date("start_date")?, row.date("end_date")?)
        .map_err(|e| row.invalid("end_date", e.reason()))?;
    Ok(Calendar {
        service_id: row.text("service_id")?.to_string(),
        week: WeekPattern::from_days(flags),
        days,
    })
}

pub fn calendar_exception(row: &Row) -> Result<CalendarException, LoadError> {
    let kind: ExceptionType = code(row, "exception_type")?
        .ok_or_else(|| row.invalid("exception_type", "required value is empty"))?;
    Ok(CalendarException {
        service_id: row.text("service_id")?.to_string(),
        date: row.date("date")?,
        kind,
    })
}

pub fn shape_point(row: &Row) -> Result<ShapePoint, LoadError> {
    Ok(ShapePoint {
        shape_id: row.text("shape_id")?.to_string(),
        sequence: row.integer("shape_pt_sequence")?,
        point: point(row, "shape_pt_lat", "shape_pt_lon")?,
        distance: row.opt_float("shape_dist_traveled")?,
    })
}

/// Build the feed metadata. The validity window is kept only when both
/// ends are given.
pub fn feed_info(row: &Row) -> Result<FeedInfo, LoadError> {
    let days = match (
        row.opt_date("feed_start_date")?,
        row.opt_date("feed_end_date")?,
    ) {
        (Some(start), Some(end)) => Some(
            DayRange::new(start, end).map_err(|e| row.invalid("feed_end_date", e.reason()))?,
        ),
        _ => None,
    };
    Ok(FeedInfo {
        publisher: row.text("feed_publisher_name")?.to_string(),
        publisher_url: row.text("feed_publisher_url")?.to_string(),
        language: row.text("feed_lang")?.to_string(),
        days,
        version: row.opt_text("feed_version")?,
        contact_email: row.opt_text("feed_contact_email")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{TableReader, TableSchema};

    fn rows(schema: &'static TableSchema, text: &str) -> Vec<Row> {
        TableReader::new(schema, text.as_bytes(), false)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    fn add_all(
        builder: &mut EntityBuilder,
        schema: &'static TableSchema,
        text: &str,
    ) -> Result<(), LoadError> {
        for row in rows(schema, text) {
            builder.add_row(&row)?;
        }
        Ok(())
    }

    const ONE_AGENCY: &str =
        "agency_id,agency_name,agency_url,agency_timezone\nIR,Iarnród Éireann,https://www.irishrail.ie,Europe/London\n";

    #[test]
    fn builds_agency_and_route() {
        let mut b = EntityBuilder::new();
        add_all(&mut b, &AGENCY, ONE_AGENCY).unwrap();
        add_all(
            &mut b,
            &ROUTES,
            "route_id,agency_id,route_short_name,route_long_name,route_type\nR1,IR,DART,Howth - Greystones,2\n",
        )
        .unwrap();
        let t = b.finish();
        assert_eq!(t.agencies["IR"].timezone, "Europe/London");
        let route = &t.routes["R1"];
        assert_eq!(route.agency_id, "IR");
        assert_eq!(route.route_type, RouteType::Rail);
        assert_eq!(route.display_name(), "DART");
    }

    #[test]
    fn route_without_agency_uses_sole_agency() {
        let mut b = EntityBuilder::new();
        add_all(&mut b, &AGENCY, ONE_AGENCY).unwrap();
        add_all(
            &mut b,
            &ROUTES,
            "route_id,route_long_name,route_type\nR1,Dublin - Cork,2\n",
        )
        .unwrap();
        assert_eq!(b.finish().routes["R1"].agency_id, "IR");
    }

    #[test]
    fn agency_id_required_with_several_agencies() {
        let mut b = EntityBuilder::new();
        let err = add_all(
            &mut b,
            &AGENCY,
            "agency_id,agency_name,agency_url,agency_timezone\n,A,http://a,Europe/Dublin\nB,B,http://b,Europe/Dublin\n",
        )
        .unwrap_err();
        match err {
            LoadError::MalformedRow { row, field, .. } => {
                assert_eq!(row, 2);
                assert_eq!(field, "agency_id");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn route_rejects_unknown_type() {
        let mut b = EntityBuilder::new();
        add_all(&mut b, &AGENCY, ONE_AGENCY).unwrap();
        let err = add_all(
            &mut b,
            &ROUTES,
            "route_id,route_short_name,route_type\nR1,X,9\n",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed row routes.txt:1 field route_type: unknown route type code 9"
        );
    }

    #[test]
    fn duplicate_stop_id() {
        let mut b = EntityBuilder::new();
        let err = add_all(
            &mut b,
            &STOPS,
            "stop_id,stop_name,stop_lat,stop_lon\nS1,Bray,53.2,-6.1\nS1,Bray Daly,53.2,-6.1\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LoadError::DuplicateKey { table: "stops.txt", ref key } if key == "S1"
        ));
    }

    #[test]
    fn stop_rejects_bad_coordinates() {
        let mut b = EntityBuilder::new();
        let err = add_all(
            &mut b,
            &STOPS,
            "stop_id,stop_name,stop_lat,stop_lon\nS1,Nowhere,95.0,-6.1\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid coordinates"));
    }

    #[test]
    fn stop_defaults() {
        let mut b = EntityBuilder::new();
        add_all(
            &mut b,
            &STOPS,
            "stop_id,stop_name,stop_lat,stop_lon,location_type,parent_station\nS1,Pearse,53.34,-6.25,,P\n",
        )
        .unwrap();
        let stop = &b.finish().stops["S1"];
        assert_eq!(stop.location_type, LocationType::Stop);
        assert_eq!(stop.parent.as_deref(), Some("P"));
        assert_eq!(stop.code, None);
    }

    #[test]
    fn stop_time_defaults_and_duplicates() {
        let mut b = EntityBuilder::new();
        let header = "trip_id,arrival_time,departure_time,stop_id,stop_sequence,pickup_type,timepoint\n";
        add_all(
            &mut b,
            &STOP_TIMES,
            &format!("{header}T1,25:10:00,25:12:00,S1,3,,\n"),
        )
        .unwrap();
        let err = add_all(
            &mut b,
            &STOP_TIMES,
            &format!("{header}T1,25:20:00,25:20:00,S2,3,1,0\n"),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateKey { ref key, .. } if key == "T1#3"));

        let t = b.finish();
        let st = &t.stop_times[0];
        assert_eq!(st.pickup, PickupDropOff::Regular);
        assert!(st.timepoint);
        assert_eq!(st.departure.to_string(), "25:12:00");
    }

    #[test]
    fn calendar_rows() {
        let mut b = EntityBuilder::new();
        add_all(
            &mut b,
            &CALENDAR,
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             WD,1,1,1,1,1,0,0,20260101,20260131\n",
        )
        .unwrap();
        let cal = &b.finish().calendars["WD"];
        assert_eq!(cal.week.to_string(), "MTWTF--");
        assert_eq!(cal.days.len(), 31);
    }

    #[test]
    fn calendar_rejects_inverted_window() {
        let mut b = EntityBuilder::new();
        let err = add_all(
            &mut b,
            &CALENDAR,
            "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
             WD,1,1,1,1,1,0,0,20260201,20260131\n",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed row calendar.txt:1 field end_date: range start is after its end"
        );
    }

    #[test]
    fn duplicate_exception_date() {
        let mut b = EntityBuilder::new();
        let err = add_all(
            &mut b,
            &CALENDAR_DATES,
            "service_id,date,exception_type\nWD,20260103,2\nWD,20260103,1\n",
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateKey { ref key, .. } if key == "WD@20260103"));
    }

    #[test]
    fn exception_rejects_unknown_type() {
        let mut b = EntityBuilder::new();
        let err = add_all(
            &mut b,
            &CALENDAR_DATES,
            "service_id,date,exception_type\nWD,20260103,3\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown exception type code 3"));
    }

    #[test]
    fn feed_info_single_row() {
        let header = "feed_publisher_name,feed_publisher_url,feed_lang,feed_start_date,feed_end_date,feed_version\n";
        let row = "NTA,https://www.nationaltransport.ie,en,20260101,20260331,v42\n";
        let mut b = EntityBuilder::new();
        add_all(&mut b, &FEED_INFO, &format!("{header}{row}")).unwrap();
        let info = b.finish().feed_info.unwrap();
        assert_eq!(info.version.as_deref(), Some("v42"));
        assert_eq!(info.days.unwrap().len(), 90);

        let mut b = EntityBuilder::new();
        let err = add_all(&mut b, &FEED_INFO, &format!("{header}{row}{row}")).unwrap_err();
        assert!(err.to_string().contains("single row"));
    }

    #[test]
    fn shape_point_duplicates() {
        let mut b = EntityBuilder::new();
        let err = add_all(
            &mut b,
            &SHAPES,
            "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence\nSH,53.1,-6.1,1\nSH,53.2,-6.2,1\n",
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateKey { table: "shapes.txt", .. }));
    }
}

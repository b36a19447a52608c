//! A small Dublin rail feed for tests.
//!
//! Each table is kept as its data lines so a test can push, drop or rewrite
//! a row before building. Column order per table is fixed by the headers
//! below.

use std::io::{Cursor, Write};

use crate::build::{EntityBuilder, Tables};
use crate::load::FeedArchive;
use crate::table::TableReader;
use crate::table::schema::{
    AGENCY, CALENDAR, CALENDAR_DATES, FEED_INFO, ROUTES, SHAPES, STOP_TIMES, STOPS, TRIPS,
};

pub const AGENCY_HEADER: &str = "agency_id,agency_name,agency_url,agency_timezone";
pub const ROUTES_HEADER: &str = "route_id,agency_id,route_short_name,route_long_name,route_type";
pub const STOPS_HEADER: &str = "stop_id,stop_name,stop_lat,stop_lon,location_type,parent_station";
pub const TRIPS_HEADER: &str = "route_id,service_id,trip_id,shape_id,trip_headsign,direction_id";
pub const STOP_TIMES_HEADER: &str = "trip_id,arrival_time,departure_time,stop_id,stop_sequence";
pub const CALENDAR_HEADER: &str =
    "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date";
pub const CALENDAR_DATES_HEADER: &str = "service_id,date,exception_type";
pub const SHAPES_HEADER: &str =
    "shape_id,shape_pt_lat,shape_pt_lon,shape_pt_sequence,shape_dist_traveled";
pub const FEED_INFO_HEADER: &str =
    "feed_publisher_name,feed_publisher_url,feed_lang,feed_start_date,feed_end_date,feed_version";

fn lines(rows: &[&str]) -> Vec<String> {
    rows.iter().map(|r| r.to_string()).collect()
}

#[derive(Debug, Clone)]
pub struct TestFeed {
    pub agency: Vec<String>,
    pub routes: Vec<String>,
    pub stops: Vec<String>,
    pub trips: Vec<String>,
    pub stop_times: Vec<String>,
    pub calendar: Vec<String>,
    pub calendar_dates: Vec<String>,
    pub shapes: Vec<String>,
    pub feed_info: Vec<String>,
}

impl TestFeed {
    /// Two DART trips on weekdays (one running past midnight), an
    /// Enterprise trip on Saturdays and one on a service that exists only
    /// as an added date.
    pub fn dublin() -> Self {
        Self {
            agency: lines(&["IR,Iarnród Éireann,https://www.irishrail.ie,Europe/Dublin"]),
            routes: lines(&[
                "DART,IR,DART,Howth - Greystones,2",
                "ICR,IR,,Dublin Connolly - Belfast,2",
            ]),
            stops: lines(&[
                "CNLLY,Dublin Connolly,53.3531,-6.24591,1,",
                "CNLLY1,Connolly Platform 1,53.3531,-6.2459,0,CNLLY",
                "CNLLY2,Connolly Platform 2,53.3532,-6.2460,0,CNLLY",
                "PERSE,Dublin Pearse,53.3433,-6.2489,0,",
                "TARA,Tara Street,53.3470,-6.2543,0,",
                "HWTH,Howth,53.3875,-6.0650,0,",
                "BRAY,Bray Daly,53.2044,-6.1009,0,",
                "DDALK,Dundalk Clarke,54.0004,-6.4132,0,",
            ]),
            trips: lines(&[
                "DART,WD,D1,SH1,Howth,0",
                "DART,WD,D2,SH1,Howth,0",
                "ICR,SAT,E1,,Belfast,0",
                "ICR,HOL,E2,,Belfast,0",
            ]),
            stop_times: lines(&[
                "D1,08:00:00,08:01:00,PERSE,1",
                "D1,08:10:00,08:11:00,TARA,2",
                "D1,08:20:00,08:22:00,CNLLY1,3",
                "D1,08:50:00,08:50:00,HWTH,4",
                "D2,23:50:00,23:51:00,PERSE,1",
                "D2,24:00:00,24:01:00,TARA,2",
                "D2,24:10:00,24:12:00,CNLLY2,3",
                "D2,24:40:00,24:40:00,HWTH,4",
                "E1,07:30:00,07:35:00,CNLLY1,1",
                "E1,08:30:00,08:32:00,DDALK,2",
                "E2,10:00:00,10:05:00,CNLLY2,1",
                "E2,11:00:00,11:00:00,DDALK,2",
            ]),
            calendar: lines(&[
                "WD,1,1,1,1,1,0,0,20260101,20260131",
                "SAT,0,0,0,0,0,1,0,20260101,20260131",
            ]),
            calendar_dates: lines(&[
                "WD,20260103,2",
                "WD,20260116,1",
                "SAT,20260101,1",
                "SAT,20260131,2",
                "HOL,20260317,1",
            ]),
            shapes: lines(&[
                "SH1,53.3433,-6.2489,1,0.0",
                "SH1,53.3470,-6.2543,2,0.6",
                "SH1,53.3531,-6.2459,3,1.5",
                "SH1,53.3875,-6.0650,4,14.2",
            ]),
            feed_info: lines(&[
                "NTA,https://www.transportforireland.ie,en,20260101,20260331,2026-01-v1",
            ]),
        }
    }

    /// Table files with headers. Optional tables without rows are left out.
    pub fn files(&self) -> Vec<(&'static str, String)> {
        let tables: [(&'static str, &str, &Vec<String>, bool); 9] = [
            (AGENCY.file, AGENCY_HEADER, &self.agency, true),
            (ROUTES.file, ROUTES_HEADER, &self.routes, true),
            (STOPS.file, STOPS_HEADER, &self.stops, true),
            (TRIPS.file, TRIPS_HEADER, &self.trips, true),
            (STOP_TIMES.file, STOP_TIMES_HEADER, &self.stop_times, true),
            (CALENDAR.file, CALENDAR_HEADER, &self.calendar, false),
            (CALENDAR_DATES.file, CALENDAR_DATES_HEADER, &self.calendar_dates, false),
            (SHAPES.file, SHAPES_HEADER, &self.shapes, false),
            (FEED_INFO.file, FEED_INFO_HEADER, &self.feed_info, false),
        ];
        tables
            .into_iter()
            .filter(|(_, _, rows, required)| *required || !rows.is_empty())
            .map(|(name, header, rows, _)| {
                let mut text = format!("{header}\n");
                for row in rows {
                    text.push_str(row);
                    text.push('\n');
                }
                (name, text)
            })
            .collect()
    }

    pub fn archive(&self) -> FeedArchive {
        let mut archive = FeedArchive::new();
        for (name, text) in self.files() {
            archive.insert(name, text.into_bytes());
        }
        archive
    }

    /// Parse and build every table, panicking on any error.
    pub fn tables(&self) -> Tables {
        let files = self.files();
        let mut builder = EntityBuilder::new();
        for schema in crate::table::KNOWN_TABLES {
            let Some((_, text)) = files.iter().find(|(name, _)| *name == schema.file) else {
                continue;
            };
            for row in TableReader::new(schema, text.as_bytes(), false).unwrap() {
                builder.add_row(&row.unwrap()).unwrap();
            }
        }
        builder.finish()
    }

    /// The feed packed as a zip archive.
    pub fn zip_bytes(&self) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, text) in self.files() {
            writer.start_file(name, options).unwrap();
            writer.write_all(text.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

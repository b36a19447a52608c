//! Static schemas of the GTFS tables this crate understands.
//!
//! Column order in a schema is the order fields appear in a parsed [`Row`],
//! regardless of the order of columns in the file.
//!
//! [`Row`]: super::Row

use FieldType::{Bool, Date, Float, Integer, Text, Time};

/// How a cell's text is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    /// Non-negative integer (u32).
    Integer,
    Float,
    /// `0` or `1`.
    Bool,
    /// `YYYYMMDD`.
    Date,
    /// `HH:MM:SS`, hour unbounded.
    Time,
}

/// One declared column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    /// Whether the column must be present in the header and non-empty in every row.
    pub required: bool,
    /// Legacy spelling accepted in place of `name`.
    pub alias: Option<&'static str>,
}

impl FieldSpec {
    const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
            alias: None,
        }
    }

    const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
            alias: None,
        }
    }

    const fn alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    /// Whether a header column names this field.
    pub fn matches(&self, column: &str) -> bool {
        self.name == column || self.alias == Some(column)
    }
}

/// Schema of one table file.
#[derive(Debug, PartialEq, Eq)]
pub struct TableSchema {
    /// File name inside the archive, e.g. `stops.txt`.
    pub file: &'static str,
    /// Whether the load fails when the file is absent.
    pub required: bool,
    pub fields: &'static [FieldSpec],
}

impl TableSchema {
    /// Position of the named field in the schema.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Look up a known table by file name.
    pub fn for_file(file: &str) -> Option<&'static TableSchema> {
        KNOWN_TABLES.iter().copied().find(|t| t.file == file)
    }
}

pub static AGENCY: TableSchema = TableSchema {
    file: "agency.txt",
    required: true,
    fields: &[
        FieldSpec::optional("agency_id", Text),
        FieldSpec::required("agency_name", Text),
        FieldSpec::required("agency_url", Text),
        FieldSpec::required("agency_timezone", Text),
        FieldSpec::optional("agency_lang", Text),
        FieldSpec::optional("agency_phone", Text),
        FieldSpec::optional("agency_fare_url", Text),
        FieldSpec::optional("agency_email", Text),
    ],
};

pub static ROUTES: TableSchema = TableSchema {
    file: "routes.txt",
    required: true,
    fields: &[
        FieldSpec::required("route_id", Text),
        FieldSpec::optional("agency_id", Text),
        FieldSpec::optional("route_short_name", Text),
        FieldSpec::optional("route_long_name", Text),
        FieldSpec::required("route_type", Integer),
        FieldSpec::optional("route_desc", Text),
        FieldSpec::optional("route_url", Text),
        FieldSpec::optional("route_color", Text),
        FieldSpec::optional("route_text_color", Text),
        FieldSpec::optional("route_sort_order", Integer),
    ],
};

pub static TRIPS: TableSchema = TableSchema {
    file: "trips.txt",
    required: true,
    fields: &[
        FieldSpec::required("route_id", Text),
        FieldSpec::required("service_id", Text),
        FieldSpec::required("trip_id", Text),
        FieldSpec::optional("trip_headsign", Text),
        FieldSpec::optional("trip_short_name", Text),
        FieldSpec::optional("direction_id", Bool),
        FieldSpec::optional("block_id", Text),
        FieldSpec::optional("shape_id", Text),
        FieldSpec::optional("wheelchair_accessible", Integer),
        FieldSpec::optional("bikes_allowed", Integer),
    ],
};

pub static STOPS: TableSchema = TableSchema {
    file: "stops.txt",
    required: true,
    fields: &[
        FieldSpec::required("stop_id", Text),
        FieldSpec::optional("stop_code", Text),
        FieldSpec::required("stop_name", Text),
        FieldSpec::optional("stop_desc", Text),
        FieldSpec::required("stop_lat", Float),
        FieldSpec::required("stop_lon", Float),
        FieldSpec::optional("zone_id", Text),
        FieldSpec::optional("stop_url", Text),
        FieldSpec::optional("location_type", Integer),
        FieldSpec::optional("parent_station", Text),
        FieldSpec::optional("stop_timezone", Text),
        FieldSpec::optional("wheelchair_boarding", Integer),
        FieldSpec::optional("platform_code", Text),
    ],
};

pub static STOP_TIMES: TableSchema = TableSchema {
    file: "stop_times.txt",
    required: true,
    fields: &[
        FieldSpec::required("trip_id", Text),
        FieldSpec::required("arrival_time", Time),
        FieldSpec::required("departure_time", Time),
        FieldSpec::required("stop_id", Text),
        FieldSpec::required("stop_sequence", Integer),
        FieldSpec::optional("stop_headsign", Text),
        FieldSpec::optional("pickup_type", Integer),
        FieldSpec::optional("drop_off_type", Integer).alias("dropoff_type"),
        FieldSpec::optional("shape_dist_traveled", Float),
        FieldSpec::optional("timepoint", Bool),
    ],
};

pub static CALENDAR: TableSchema = TableSchema {
    file: "calendar.txt",
    required: false,
    fields: &[
        FieldSpec::required("service_id", Text),
        FieldSpec::required("monday", Bool),
        FieldSpec::required("tuesday", Bool),
        FieldSpec::required("wednesday", Bool),
        FieldSpec::required("thursday", Bool),
        FieldSpec::required("friday", Bool),
        FieldSpec::required("saturday", Bool),
        FieldSpec::required("sunday", Bool),
        FieldSpec::required("start_date", Date),
        FieldSpec::required("end_date", Date),
    ],
};

pub static CALENDAR_DATES: TableSchema = TableSchema {
    file: "calendar_dates.txt",
    required: false,
    fields: &[
        FieldSpec::required("service_id", Text),
        FieldSpec::required("date", Date),
        FieldSpec::required("exception_type", Integer),
    ],
};

pub static SHAPES: TableSchema = TableSchema {
    file: "shapes.txt",
    required: false,
    fields: &[
        FieldSpec::required("shape_id", Text),
        FieldSpec::required("shape_pt_lat", Float),
        FieldSpec::required("shape_pt_lon", Float),
        FieldSpec::required("shape_pt_sequence", Integer),
        FieldSpec::optional("shape_dist_traveled", Float),
    ],
};

pub static FEED_INFO: TableSchema = TableSchema {
    file: "feed_info.txt",
    required: false,
    fields: &[
        FieldSpec::required("feed_publisher_name", Text),
        FieldSpec::required("feed_publisher_url", Text),
        FieldSpec::required("feed_lang", Text),
        FieldSpec::optional("default_lang", Text),
        FieldSpec::optional("feed_start_date", Date),
        FieldSpec::optional("feed_end_date", Date),
        FieldSpec::optional("feed_version", Text),
        FieldSpec::optional("feed_contact_email", Text),
        FieldSpec::optional("feed_contact_url", Text),
    ],
};

/// Every table the loader reads, in load order.
pub static KNOWN_TABLES: [&TableSchema; 9] = [
    &FEED_INFO,
    &AGENCY,
    &CALENDAR,
    &CALENDAR_DATES,
    &ROUTES,
    &SHAPES,
    &STOPS,
    &TRIPS,
    &STOP_TIMES,
];

//! Domain types for GTFS schedules.
//!
//! Value types here enforce their invariants at construction time (a
//! `DayRange` never ends before it starts, a `Point` is always on the globe),
//! so code holding one does not need to re-check it.

mod codes;
mod point;
mod records;
mod time;

pub use codes::{
    Direction, ExceptionType, InvalidCode, LocationType, PickupDropOff, RouteType, WeekPattern,
};
pub use point::{InvalidPoint, Point};
pub use records::{
    Agency, Calendar, CalendarException, FeedInfo, Route, ShapePoint, Stop, StopTime, Trip,
};
pub use time::{DayRange, DayTime, SECONDS_PER_DAY, TimeError, parse_gtfs_date};

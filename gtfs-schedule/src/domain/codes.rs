//! Enumerated GTFS codes.
//!
//! Each enum is built from the integer code found in the feed and rejects
//! codes outside the reference's range, so a loaded schedule never holds an
//! unknown value.

use chrono::Weekday;
use std::fmt;

/// Error returned for an integer code outside an enumeration's range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} code {code}")]
pub struct InvalidCode {
    kind: &'static str,
    code: u32,
}

impl InvalidCode {
    fn new(kind: &'static str, code: u32) -> Self {
        Self { kind, code }
    }
}

/// Mode of transport of a route (`routes.txt/route_type`).
///
/// Basic codes get their own variant; the extended hierarchy (100-1799)
/// is kept as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteType {
    LightRail,
    Subway,
    Rail,
    Bus,
    Ferry,
    CableTram,
    AerialLift,
    Funicular,
    Trolleybus,
    Monorail,
    /// Extended route type, 100-1799.
    Extended(u16),
}

impl RouteType {
    /// The numeric code as written in the feed.
    pub fn code(&self) -> u32 {
        match self {
            RouteType::LightRail => 0,
            RouteType::Subway => 1,
            RouteType::Rail => 2,
            RouteType::Bus => 3,
            RouteType::Ferry => 4,
            RouteType::CableTram => 5,
            RouteType::AerialLift => 6,
            RouteType::Funicular => 7,
            RouteType::Trolleybus => 11,
            RouteType::Monorail => 12,
            RouteType::Extended(code) => u32::from(*code),
        }
    }

    /// Whether this is a rail mode (basic rail types or extended 100-199,
    /// 400-499).
    pub fn is_rail(&self) -> bool {
        match self {
            RouteType::Rail | RouteType::LightRail | RouteType::Subway | RouteType::Monorail => {
                true
            }
            RouteType::Extended(code) => matches!(code, 100..=199 | 400..=499),
            _ => false,
        }
    }
}

impl TryFrom<u32> for RouteType {
    type Error = InvalidCode;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => RouteType::LightRail,
            1 => RouteType::Subway,
            2 => RouteType::Rail,
            3 => RouteType::Bus,
            4 => RouteType::Ferry,
            5 => RouteType::CableTram,
            6 => RouteType::AerialLift,
            7 => RouteType::Funicular,
            11 => RouteType::Trolleybus,
            12 => RouteType::Monorail,
            // range check guarantees the code fits in u16
            100..=1799 => RouteType::Extended(code as u16),
            _ => return Err(InvalidCode::new("route type", code)),
        })
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteType::LightRail => f.write_str("light rail"),
            RouteType::Subway => f.write_str("subway"),
            RouteType::Rail => f.write_str("rail"),
            RouteType::Bus => f.write_str("bus"),
            RouteType::Ferry => f.write_str("ferry"),
            RouteType::CableTram => f.write_str("cable tram"),
            RouteType::AerialLift => f.write_str("aerial lift"),
            RouteType::Funicular => f.write_str("funicular"),
            RouteType::Trolleybus => f.write_str("trolleybus"),
            RouteType::Monorail => f.write_str("monorail"),
            RouteType::Extended(code) => write!(f, "extended {code}"),
        }
    }
}

/// Kind of location in `stops.txt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocationType {
    /// A stop or platform (code 0 or empty).
    #[default]
    Stop,
    /// A station containing one or more platforms.
    Station,
    /// A station entrance or exit.
    Entrance,
    /// A generic node inside a station.
    GenericNode,
    /// A boarding area on a platform.
    BoardingArea,
}

impl TryFrom<u32> for LocationType {
    type Error = InvalidCode;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => LocationType::Stop,
            1 => LocationType::Station,
            2 => LocationType::Entrance,
            3 => LocationType::GenericNode,
            4 => LocationType::BoardingArea,
            _ => return Err(InvalidCode::new("location type", code)),
        })
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LocationType::Stop => "stop",
            LocationType::Station => "station",
            LocationType::Entrance => "entrance",
            LocationType::GenericNode => "generic node",
            LocationType::BoardingArea => "boarding area",
        })
    }
}

/// Pickup or drop-off arrangement at a stop time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PickupDropOff {
    #[default]
    Regular,
    NotAvailable,
    PhoneAgency,
    CoordinateWithDriver,
}

impl TryFrom<u32> for PickupDropOff {
    type Error = InvalidCode;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => PickupDropOff::Regular,
            1 => PickupDropOff::NotAvailable,
            2 => PickupDropOff::PhoneAgency,
            3 => PickupDropOff::CoordinateWithDriver,
            _ => return Err(InvalidCode::new("pickup/drop-off type", code)),
        })
    }
}

impl fmt::Display for PickupDropOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PickupDropOff::Regular => "regular",
            PickupDropOff::NotAvailable => "not available",
            PickupDropOff::PhoneAgency => "phone agency",
            PickupDropOff::CoordinateWithDriver => "coordinate with driver",
        })
    }
}

/// Effect of a `calendar_dates.txt` row.
///
/// `Added` orders before `Removed`, so applying a date's exceptions in
/// sorted order lets a removal win over an addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExceptionType {
    /// Service runs on the date (code 1).
    Added,
    /// Service does not run on the date (code 2).
    Removed,
}

impl TryFrom<u32> for ExceptionType {
    type Error = InvalidCode;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(ExceptionType::Added),
            2 => Ok(ExceptionType::Removed),
            _ => Err(InvalidCode::new("exception type", code)),
        }
    }
}

/// Travel direction of a trip (`trips.txt/direction_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Code 0.
    Outbound,
    /// Code 1.
    Inbound,
}

impl From<bool> for Direction {
    fn from(inbound: bool) -> Self {
        if inbound {
            Direction::Inbound
        } else {
            Direction::Outbound
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
        })
    }
}

/// Weekly recurrence of a service, one bit per day (Monday is bit 0).
///
/// # Examples
///
/// ```
/// use chrono::Weekday;
/// use gtfs_schedule::domain::WeekPattern;
///
/// let weekdays = WeekPattern::from_days([true, true, true, true, true, false, false]);
/// assert!(weekdays.runs_on(Weekday::Fri));
/// assert!(!weekdays.runs_on(Weekday::Sat));
/// assert_eq!(weekdays.to_string(), "MTWTF--");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeekPattern(u8);

impl WeekPattern {
    /// Build from seven flags, Monday first.
    pub fn from_days(days: [bool; 7]) -> Self {
        let bits = days
            .iter()
            .enumerate()
            .filter(|(_, active)| **active)
            .fold(0u8, |acc, (i, _)| acc | (1 << i));
        Self(bits)
    }

    /// Whether the service runs on the given weekday.
    pub fn runs_on(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Whether no weekday is active.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// The seven flags, Monday first.
    pub fn days(&self) -> [bool; 7] {
        std::array::from_fn(|i| self.0 & (1 << i) != 0)
    }
}

impl fmt::Debug for WeekPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeekPattern({self})")
    }
}

impl fmt::Display for WeekPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LETTERS: [char; 7] = ['M', 'T', 'W', 'T', 'F', 'S', 'S'];
        for (letter, active) in LETTERS.iter().zip(self.days()) {
            write!(f, "{}", if active { *letter } else { '-' })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_type_codes() {
        assert_eq!(RouteType::try_from(2).unwrap(), RouteType::Rail);
        assert_eq!(RouteType::try_from(12).unwrap(), RouteType::Monorail);
        assert_eq!(RouteType::try_from(714).unwrap(), RouteType::Extended(714));
        assert!(RouteType::try_from(8).is_err());
        assert!(RouteType::try_from(99).is_err());
        assert!(RouteType::try_from(1800).is_err());
        for code in [0, 1, 2, 3, 4, 5, 6, 7, 11, 12, 100, 1799] {
            assert_eq!(RouteType::try_from(code).unwrap().code(), code);
        }
    }

    #[test]
    fn route_type_rail() {
        assert!(RouteType::Rail.is_rail());
        assert!(RouteType::Extended(109).is_rail());
        assert!(RouteType::Extended(401).is_rail());
        assert!(!RouteType::Bus.is_rail());
        assert!(!RouteType::Extended(714).is_rail());
    }

    #[test]
    fn invalid_code_display() {
        let err = LocationType::try_from(5).unwrap_err();
        assert_eq!(err.to_string(), "unknown location type code 5");
        let err = ExceptionType::try_from(0).unwrap_err();
        assert_eq!(err.to_string(), "unknown exception type code 0");
    }

    #[test]
    fn location_and_pickup_codes() {
        assert_eq!(LocationType::try_from(1).unwrap(), LocationType::Station);
        assert_eq!(LocationType::default(), LocationType::Stop);
        assert_eq!(
            PickupDropOff::try_from(3).unwrap(),
            PickupDropOff::CoordinateWithDriver
        );
        assert!(PickupDropOff::try_from(4).is_err());
    }

    #[test]
    fn direction_from_flag() {
        assert_eq!(Direction::from(false), Direction::Outbound);
        assert_eq!(Direction::from(true).to_string(), "inbound");
    }

    #[test]
    fn week_pattern_roundtrip() {
        let days = [false, true, false, true, false, true, true];
        let pattern = WeekPattern::from_days(days);
        assert_eq!(pattern.days(), days);
        assert!(pattern.runs_on(Weekday::Sun));
        assert!(!pattern.runs_on(Weekday::Mon));
        assert_eq!(format!("{pattern:?}"), "WeekPattern(-T-T-SS)");
    }

    #[test]
    fn empty_week_pattern() {
        let pattern = WeekPattern::from_days([false; 7]);
        assert!(pattern.is_empty());
        assert_eq!(pattern.to_string(), "-------");
    }
}

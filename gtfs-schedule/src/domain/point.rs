//! Geographic coordinates.

use std::fmt;

/// Error returned when a coordinate is outside the WGS84 range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
pub struct InvalidPoint {
    latitude: f64,
    longitude: f64,
}

/// A WGS84 location in decimal degrees.
///
/// Latitude is within [-90, 90] and longitude within [-180, 180]; this is
/// checked at construction.
///
/// # Examples
///
/// ```
/// use gtfs_schedule::domain::Point;
///
/// let connolly = Point::new(53.3531, -6.24591).unwrap();
/// assert_eq!(connolly.latitude(), 53.3531);
///
/// assert!(Point::new(91.0, 0.0).is_err());
/// assert!(Point::new(0.0, -180.5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    latitude: f64,
    longitude: f64,
}

impl Point {
    /// Create a point, validating both coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidPoint> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidPoint {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude and longitude as degrees, minutes and seconds.
    ///
    /// Seconds are rounded to 0.01 (about 30cm at the equator).
    ///
    /// # Examples
    ///
    /// ```
    /// use gtfs_schedule::domain::Point;
    ///
    /// let p = Point::new(53.3531, -6.24591).unwrap();
    /// let (lat, lon) = p.to_dms();
    /// assert_eq!(lat, "53°21′11.16″N");
    /// assert_eq!(lon, "6°14′45.28″W");
    /// ```
    pub fn to_dms(&self) -> (String, String) {
        (
            dms(self.latitude, 'N', 'S'),
            dms(self.longitude, 'E', 'W'),
        )
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.7},{:.7}", self.latitude, self.longitude)
    }
}

fn dms(value: f64, positive: char, negative: char) -> String {
    let abs = value.abs();
    let mut degrees = abs.trunc() as u32;
    let total_minutes = (abs - abs.trunc()) * 60.0;
    let mut minutes = total_minutes.trunc() as u32;
    let mut seconds = ((total_minutes - total_minutes.trunc()) * 60.0 * 100.0).round() / 100.0;
    // rounding can push seconds (and then minutes) up to 60
    if seconds >= 60.0 {
        seconds = 0.0;
        minutes += 1;
    }
    if minutes >= 60 {
        minutes = 0;
        degrees += 1;
    }
    let hemisphere = if value >= 0.0 { positive } else { negative };
    format!("{degrees}°{minutes}′{seconds:.2}″{hemisphere}")
}

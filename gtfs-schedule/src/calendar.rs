//! Calendar resolver.
//!
//! Every service id is expanded once, at load time, into the exact set of
//! civil dates on which it runs: the dates of its validity window that fall
//! on an active weekday, plus dates added by `calendar_dates.txt`, minus
//! dates removed there.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};

use crate::domain::{Calendar, CalendarException, ExceptionType};

/// Active dates of every service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceCalendar {
    active: HashMap<String, HashSet<NaiveDate>>,
    calendars: HashMap<String, Calendar>,
    /// Exceptions per service, by date.
    exceptions: HashMap<String, Vec<CalendarException>>,
}

impl ServiceCalendar {
    /// Expand weekly patterns and apply exceptions.
    ///
    /// Exceptions are applied in date order. For a date with both an
    /// addition and a removal the removal wins, whatever order they were
    /// given in. Removing a date that is not active does nothing; a service
    /// that only appears in exceptions runs on exactly its added dates.
    pub fn resolve(
        calendars: HashMap<String, Calendar>,
        exceptions: Vec<CalendarException>,
    ) -> Self {
        let mut active: HashMap<String, HashSet<NaiveDate>> = calendars
            .values()
            .map(|cal| {
                let dates = cal
                    .days
                    .days()
                    .filter(|d| cal.week.runs_on(d.weekday()))
                    .collect();
                (cal.service_id.clone(), dates)
            })
            .collect();

        let mut by_service: HashMap<String, Vec<CalendarException>> = HashMap::new();
        for exc in exceptions {
            by_service
                .entry(exc.service_id.clone())
                .or_default()
                .push(exc);
        }
        for (service_id, list) in &mut by_service {
            list.sort_by_key(|e| (e.date, e.kind));
            let dates = active.entry(service_id.clone()).or_default();
            for exc in list.iter() {
                match exc.kind {
                    ExceptionType::Added => {
                        dates.insert(exc.date);
                    }
                    ExceptionType::Removed => {
                        dates.remove(&exc.date);
                    }
                }
            }
        }

        Self {
            active,
            calendars,
            exceptions: by_service,
        }
    }

    /// Whether the service runs on the date. Unknown services never run.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use chrono::NaiveDate;
    /// use gtfs_schedule::calendar::ServiceCalendar;
    /// use gtfs_schedule::domain::{CalendarException, ExceptionType};
    ///
    /// let xmas = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
    /// let calendar = ServiceCalendar::resolve(
    ///     HashMap::new(),
    ///     vec![CalendarException {
    ///         service_id: "XMAS".into(),
    ///         date: xmas,
    ///         kind: ExceptionType::Added,
    ///     }],
    /// );
    /// assert!(calendar.is_active("XMAS", xmas));
    /// assert!(!calendar.is_active("XMAS", xmas.succ_opt().unwrap()));
    /// assert!(!calendar.is_active("NOPE", xmas));
    /// ```
    pub fn is_active(&self, service_id: &str, date: NaiveDate) -> bool {
        self.active
            .get(service_id)
            .is_some_and(|dates| dates.contains(&date))
    }

    /// Whether the service id is known from either table.
    pub fn contains(&self, service_id: &str) -> bool {
        self.active.contains_key(service_id)
    }

    /// Active dates of a service, ascending; `None` for an unknown service.
    pub fn active_dates(&self, service_id: &str) -> Option<Vec<NaiveDate>> {
        let mut dates: Vec<_> = self.active.get(service_id)?.iter().copied().collect();
        dates.sort_unstable();
        Some(dates)
    }

    /// Services running on the date, sorted by id.
    pub fn services_on(&self, date: NaiveDate) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .active
            .iter()
            .filter(|(_, dates)| dates.contains(&date))
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn calendar(&self, service_id: &str) -> Option<&Calendar> {
        self.calendars.get(service_id)
    }

    /// Exceptions of a service, by date.
    pub fn exceptions(&self, service_id: &str) -> &[CalendarException] {
        self.exceptions
            .get(service_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn service_count(&self) -> usize {
        self.active.len()
    }
}

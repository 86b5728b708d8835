// src/reports/dates.rs

use chrono::{Datelike, Duration, Local, NaiveDate};

/// Date format the portal's report forms expect.
pub const PORTAL_DATE_FORMAT: &str = "%m/%d/%Y";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn format_portal_date(date: NaiveDate) -> String {
    date.format(PORTAL_DATE_FORMAT).to_string()
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Calendar quarter, 1..=4.
pub fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
    pub quarter: u32,
}

impl Period {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            quarter: quarter(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_format() {
        assert_eq!(format_portal_date(d(2024, 3, 7)), "03/07/2024");
    }

    #[test]
    fn test_week_start() {
        // 2024-05-15 is a Wednesday
        assert_eq!(week_start(d(2024, 5, 15)), d(2024, 5, 13));
        assert_eq!(week_start(d(2024, 5, 13)), d(2024, 5, 13));
        // Sunday belongs to the week that started the previous Monday
        assert_eq!(week_start(d(2024, 5, 19)), d(2024, 5, 13));
        // across a year boundary
        assert_eq!(week_start(d(2025, 1, 1)), d(2024, 12, 30));
    }

    #[test]
    fn test_quarters() {
        let expected = [1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4];
        for (month, q) in (1..=12).zip(expected) {
            assert_eq!(quarter(d(2024, month, 1)), q, "month {}", month);
        }
        assert_eq!(
            Period::of(d(2023, 11, 30)),
            Period {
                year: 2023,
                month: 11,
                quarter: 4
            }
        );
    }
}

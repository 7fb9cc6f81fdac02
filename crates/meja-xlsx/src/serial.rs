//! Excel serial dates (1900 date system).

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use meja_core::CellValue;

const SECONDS_PER_DAY: f64 = 86_400.0;

fn epoch() -> NaiveDateTime {
    // Serial 0 is 1899-12-30; serial 60 is the phantom 1900-02-29.
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN)
}

pub fn to_excel_serial(dt: NaiveDateTime) -> f64 {
    let delta = dt - epoch();
    delta.num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// A serial without a time part becomes a date, anything else a date-time.
pub fn from_excel_serial(serial: f64) -> Option<CellValue> {
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * SECONDS_PER_DAY * 1000.0).round() as i64;
    let dt = epoch().checked_add_signed(Duration::try_milliseconds(millis)?)?;
    if dt.time() == NaiveTime::MIN {
        Some(CellValue::Date(dt.date()))
    } else {
        Some(CellValue::DateTime(dt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let serial = to_excel_serial(date.and_time(NaiveTime::MIN));
        assert_eq!(serial, 45352.0);
        assert_eq!(from_excel_serial(serial), Some(CellValue::Date(date)));

        let dt = date.and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(to_excel_serial(dt), 45352.5);
        assert_eq!(from_excel_serial(45352.5), Some(CellValue::DateTime(dt)));
        assert_eq!(from_excel_serial(f64::NAN), None);
    }
}

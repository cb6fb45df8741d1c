use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Anything that can be resolved to a single UTC instant.
///
/// Naive values (without an offset) are interpreted as UTC. Strings are tried as RFC 3339
/// (`2023-01-01T00:00:00+01:00`), then as naive datetimes (`2023-01-01 00:00:00` or
/// `2023-01-01T00:00:00`) and finally as plain dates (`2023-01-01`, midnight).
pub trait IntoUtcDateTime {
    fn into_utc(self) -> Option<DateTime<Utc>>;
}

impl IntoUtcDateTime for NaiveDateTime {
    fn into_utc(self) -> Option<DateTime<Utc>> {
        Some(Utc.from_utc_datetime(&self))
    }
}

impl IntoUtcDateTime for NaiveDate {
    fn into_utc(self) -> Option<DateTime<Utc>> {
        self.and_hms_opt(0, 0, 0).and_then(IntoUtcDateTime::into_utc)
    }
}

impl IntoUtcDateTime for DateTime<Local> {
    fn into_utc(self) -> Option<DateTime<Utc>> {
        Some(self.with_timezone(&Utc))
    }
}

impl IntoUtcDateTime for DateTime<Utc> {
    fn into_utc(self) -> Option<DateTime<Utc>> {
        Some(self)
    }
}

impl IntoUtcDateTime for DateTime<FixedOffset> {
    fn into_utc(self) -> Option<DateTime<Utc>> {
        Some(self.with_timezone(&Utc))
    }
}

impl IntoUtcDateTime for &str {
    fn into_utc(self) -> Option<DateTime<Utc>> {
        let text = self.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return dt.into_utc();
        }
        for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
            if let Ok(naive_dt) = NaiveDateTime::parse_from_str(text, format) {
                return naive_dt.into_utc();
            }
        }
        if let Ok(naive_date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return naive_date.into_utc();
        }
        None
    }
}

impl IntoUtcDateTime for String {
    fn into_utc(self) -> Option<DateTime<Utc>> {
        self.as_str().into_utc()
    }
}

impl IntoUtcDateTime for &String {
    fn into_utc(self) -> Option<DateTime<Utc>> {
        self.as_str().into_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_naive_inputs_are_utc() {
        let date = NaiveDate::from_ymd_opt(1953, 1, 1).unwrap();
        assert_eq!(date.into_utc(), Some(utc(1953, 1, 1, 0)));
        assert_eq!(
            date.and_hms_opt(6, 0, 0).unwrap().into_utc(),
            Some(utc(1953, 1, 1, 6))
        );
    }

    #[test]
    fn test_offset_inputs_are_normalized() {
        let dt = DateTime::parse_from_rfc3339("2023-01-01T01:00:00+01:00").unwrap();
        assert_eq!(dt.into_utc(), Some(utc(2023, 1, 1, 0)));
        assert_eq!("2023-01-01T01:00:00+01:00".into_utc(), Some(utc(2023, 1, 1, 0)));
    }

    #[test]
    fn test_string_formats() {
        assert_eq!("2023-01-01".into_utc(), Some(utc(2023, 1, 1, 0)));
        assert_eq!("2023-01-01 12:00:00".into_utc(), Some(utc(2023, 1, 1, 12)));
        assert_eq!(
            String::from("2023-01-01T12:00:00").into_utc(),
            Some(utc(2023, 1, 1, 12))
        );
        assert_eq!("2023-01-01T12:00:00Z".into_utc(), Some(utc(2023, 1, 1, 12)));
        assert_eq!("first of january".into_utc(), None);
    }
}

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Publish date as it arrives from upstream.
///
/// CMS posts and feeds deliver timestamps as strings in whatever format the
/// origin uses; archive views sometimes carry a decomposed calendar date.
/// Both resolve through [`DateValue::to_instant`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Iso(String),
    Ymd { year: i32, month: u32, day: u32 },
}

impl DateValue {
    /// Resolve to a UTC instant. `Ymd` resolves to midnight UTC.
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            DateValue::Iso(raw) => parse_timestamp(raw),
            DateValue::Ymd { year, month, day } => NaiveDate::from_ymd_opt(*year, *month, *day)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
        }
    }

    /// Like [`to_instant`](Self::to_instant), but unparsable dates sort as
    /// the Unix epoch instead of failing.
    pub fn instant_or_epoch(&self) -> DateTime<Utc> {
        self.to_instant().unwrap_or_else(|| {
            tracing::warn!(date = ?self, "Unparsable publish date, treating as epoch");
            DateTime::<Utc>::UNIX_EPOCH
        })
    }

    /// Calendar date of this value as seen from `zone`.
    ///
    /// A post at `2023-12-01T08:00+09:00` is on December 1st in Tokyo but
    /// November 30th in UTC; archive views must use the reader's zone.
    pub fn to_ymd(&self, zone: FixedOffset) -> Option<DateValue> {
        match self {
            DateValue::Ymd { .. } => Some(self.clone()),
            DateValue::Iso(_) => self.to_instant().map(|dt| {
                let local = dt.with_timezone(&zone);
                DateValue::Ymd {
                    year: local.year(),
                    month: local.month(),
                    day: local.day(),
                }
            }),
        }
    }

    /// RFC 3339 rendering (`2023-12-15T00:00:00.000Z` for a `Ymd`).
    pub fn to_iso(&self) -> Option<DateValue> {
        match self {
            DateValue::Iso(_) => Some(self.clone()),
            DateValue::Ymd { .. } => self
                .to_instant()
                .map(|dt| DateValue::Iso(dt.to_rfc3339_opts(SecondsFormat::Millis, true))),
        }
    }
}

impl From<&str> for DateValue {
    fn from(raw: &str) -> Self {
        DateValue::Iso(raw.to_string())
    }
}

impl From<String> for DateValue {
    fn from(raw: String) -> Self {
        DateValue::Iso(raw)
    }
}

/// Offset archive dates are shown in unless configured otherwise (JST).
pub const DEFAULT_DISPLAY_OFFSET_SECS: i32 = 9 * 60 * 60;

pub fn default_display_zone() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_DISPLAY_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Parse a UTC offset such as `+09:00`, `-0530`, `+09` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parse the timestamp formats seen in Ghost responses and RSS/Atom feeds.
///
/// Tries RFC 3339 (Ghost, Atom), RFC 2822 (RSS `pubDate`), zone-less
/// date-times (read as UTC) and bare `YYYY-MM-DD` dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_timestamp("2023-12-15T19:00:00.000+09:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 12, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc2822_pub_date() {
        let dt = parse_timestamp("Thu, 14 Dec 2023 10:00:00 GMT").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 12, 14, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_bare_date_and_naive_datetime() {
        assert_eq!(
            parse_timestamp("2024-02-29"),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-02-29T08:30:00"),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday-ish"), None);
    }

    #[test]
    fn test_ymd_resolves_to_midnight_utc() {
        let value = DateValue::Ymd {
            year: 2023,
            month: 12,
            day: 15,
        };
        assert_eq!(
            value.to_instant(),
            Some(Utc.with_ymd_and_hms(2023, 12, 15, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_ymd_falls_back_to_epoch() {
        let value = DateValue::Ymd {
            year: 2023,
            month: 2,
            day: 30,
        };
        assert_eq!(value.to_instant(), None);
        assert_eq!(value.instant_or_epoch(), DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn test_iso_and_ymd_convert_both_ways() {
        let iso = DateValue::from("2023-12-15T10:00:00.000Z");
        let ymd = iso.to_ymd(Utc.fix()).unwrap();
        assert_eq!(
            ymd,
            DateValue::Ymd {
                year: 2023,
                month: 12,
                day: 15
            }
        );
        assert_eq!(
            ymd.to_iso(),
            Some(DateValue::Iso("2023-12-15T00:00:00.000Z".to_string()))
        );
    }

    #[test]
    fn test_to_ymd_uses_display_zone() {
        let early = DateValue::from("2023-12-01T08:00:00.000+09:00");
        assert_eq!(
            early.to_ymd(default_display_zone()),
            Some(DateValue::Ymd {
                year: 2023,
                month: 12,
                day: 1
            })
        );
        assert_eq!(
            early.to_ymd(Utc.fix()),
            Some(DateValue::Ymd {
                year: 2023,
                month: 11,
                day: 30
            })
        );
    }

    #[test]
    fn test_parse_utc_offset_forms() {
        let east = |secs| FixedOffset::east_opt(secs).unwrap();
        assert_eq!(parse_utc_offset("+09:00"), Some(east(9 * 3600)));
        assert_eq!(parse_utc_offset("+0900"), Some(east(9 * 3600)));
        assert_eq!(parse_utc_offset("+09"), Some(east(9 * 3600)));
        assert_eq!(parse_utc_offset("-05:30"), Some(east(-(5 * 3600 + 30 * 60))));
        assert_eq!(parse_utc_offset("Z"), Some(east(0)));
        assert_eq!(parse_utc_offset("09:00"), None);
        assert_eq!(parse_utc_offset("+25:00"), None);
        assert_eq!(parse_utc_offset("+9:0"), None);
        assert_eq!(parse_utc_offset("Asia/Tokyo"), None);
    }

    #[test]
    fn test_serde_untagged_shapes() {
        let iso: DateValue = serde_json::from_str(r#""2023-12-15T10:00:00Z""#).unwrap();
        assert!(matches!(iso, DateValue::Iso(_)));

        let ymd: DateValue = serde_json::from_str(r#"{"year":2023,"month":1,"day":2}"#).unwrap();
        assert_eq!(
            ymd,
            DateValue::Ymd {
                year: 2023,
                month: 1,
                day: 2
            }
        );
        assert_eq!(
            serde_json::to_string(&ymd).unwrap(),
            r#"{"year":2023,"month":1,"day":2}"#
        );
    }
}

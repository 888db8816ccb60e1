use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

/// Offset-aware layouts, tried in order.
const AWARE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
];

/// Layouts without an offset; `default_offset` is assumed.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse a phase timestamp into an offset-aware instant.
///
/// Accepts RFC 3339 and `YYYY-MM-DD HH:MM[:SS[.fff]]` with an optional
/// `Z`/`±HH:MM` suffix. Stamps without an offset are read in `default_offset`.
pub fn convert_time(text: &str, default_offset: FixedOffset) -> Result<DateTime<FixedOffset>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty timestamp".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt);
    }

    let zulu = text
        .strip_suffix('Z')
        .or_else(|| text.strip_suffix('z'))
        .map(|t| format!("{}+00:00", t.trim_end()));
    let candidate = zulu.as_deref().unwrap_or(text);

    for format in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(candidate, format) {
            return Ok(dt);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return default_offset
                .from_local_datetime(&naive)
                .single()
                .ok_or_else(|| format!("ambiguous local time {text:?}"));
        }
    }

    Err(format!("unrecognised timestamp {text:?}"))
}

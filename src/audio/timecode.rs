use crate::error::TimecodeError;

/// Parse `[[h:]m:]s[.mmm]` into seconds
///
/// Plain seconds (`"12.5"`) are accepted as-is. With colons, minutes and
/// seconds must be below 60 and the fraction carries at most millisecond
/// precision.
pub fn parse_timecode(input: &str) -> Result<f64, TimecodeError> {
    let input = input.trim();
    let invalid = || TimecodeError::Invalid(input.to_string());

    if input.is_empty() {
        return Err(invalid());
    }

    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() == 1 {
        let secs: f64 = input.parse().map_err(|_| invalid())?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(invalid());
        }
        return Ok(secs);
    }
    if parts.len() > 3 {
        return Err(invalid());
    }

    let (hours, minutes) = match parts.len() {
        3 => (parse_field(parts[0], input)?, parse_field(parts[1], input)?),
        _ => (0, parse_field(parts[0], input)?),
    };

    let last = parts[parts.len() - 1];
    let (secs_str, millis_str) = match last.split_once('.') {
        Some((s, ms)) => (s, Some(ms)),
        None => (last, None),
    };
    let seconds = parse_field(secs_str, input)?;
    // ".5" is half a second, not five milliseconds
    let millis = match millis_str {
        Some(ms) if ms.len() > 3 => return Err(TimecodeError::MillisOutOfRange),
        Some(ms) => parse_field(ms, input)? * 10u64.pow(3 - ms.len() as u32),
        None => 0,
    };

    if minutes >= 60 {
        return Err(TimecodeError::MinutesOutOfRange);
    }
    if seconds >= 60 {
        return Err(TimecodeError::SecondsOutOfRange);
    }
    if millis >= 1000 {
        return Err(TimecodeError::MillisOutOfRange);
    }

    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds as f64 + millis as f64 / 1000.0)
}

fn parse_field(field: &str, input: &str) -> Result<u64, TimecodeError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimecodeError::Invalid(input.to_string()));
    }
    field.parse().map_err(|_| TimecodeError::Invalid(input.to_string()))
}

/// `mm:ss`, or `hh:mm:ss` from one hour up
pub fn format_clock(secs: f64) -> String {
    let total = secs.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// `mm:ss.mmm`
pub fn format_precise(secs: f64) -> String {
    let secs = secs.max(0.0);
    let total_millis = (secs * 1000.0).floor() as u64;
    let minutes = total_millis / 60_000;
    let seconds = (total_millis / 1000) % 60;
    let millis = total_millis % 1000;
    format!("{:02}:{:02}.{:03}", minutes, seconds, millis)
}

/// Spacing between time ruler labels for a buffer of this length
pub fn ruler_interval(duration_secs: f64) -> f64 {
    match duration_secs {
        d if d > 1800.0 => 60.0,
        d if d > 600.0 => 30.0,
        d if d > 300.0 => 10.0,
        d if d > 60.0 => 5.0,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_seconds() {
        assert_eq!(parse_timecode("2"), Ok(2.0));
        assert_eq!(parse_timecode(" 3.25 "), Ok(3.25));
    }

    #[test]
    fn test_parse_clock_forms() {
        assert_eq!(parse_timecode("1:05"), Ok(65.0));
        assert_eq!(parse_timecode("01:02.500"), Ok(62.5));
        assert_eq!(parse_timecode("1:00:00"), Ok(3600.0));
        let precise = parse_timecode("2:03:04.005").unwrap();
        assert!((precise - 7384.005).abs() < 1e-9);
        assert_eq!(parse_timecode("0:01.5"), Ok(1.5));
    }

    #[test]
    fn test_parse_rejects_out_of_range_fields() {
        assert_eq!(parse_timecode("61:00"), Err(TimecodeError::MinutesOutOfRange));
        assert_eq!(parse_timecode("1:60"), Err(TimecodeError::SecondsOutOfRange));
        assert_eq!(parse_timecode("0:01.1000"), Err(TimecodeError::MillisOutOfRange));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "abc", "-1", "1:-2", "1::2", "1:2:3:4", "inf", "1:2.x"] {
            assert!(parse_timecode(bad).is_err(), "'{}' should not parse", bad);
        }
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(65.9), "01:05");
        assert_eq!(format_clock(3725.0), "01:02:05");
    }

    #[test]
    fn test_format_precise() {
        assert_eq!(format_precise(62.5), "01:02.500");
        assert_eq!(format_precise(0.0), "00:00.000");
    }

    #[test]
    fn test_ruler_interval_steps() {
        assert_eq!(ruler_interval(30.0), 1.0);
        assert_eq!(ruler_interval(61.0), 5.0);
        assert_eq!(ruler_interval(301.0), 10.0);
        assert_eq!(ruler_interval(601.0), 30.0);
        assert_eq!(ruler_interval(1801.0), 60.0);
    }
}

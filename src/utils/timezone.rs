use chrono::NaiveTime;
use chrono_tz::Tz;
use thiserror::Error;

/// Error types for timezone operations
#[derive(Debug, Error)]
pub enum TimezoneError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
    #[error("Invalid time format: {0}")]
    InvalidTime(String),
}

/// Parse an IANA timezone identifier
pub fn parse_timezone(tz_str: &str) -> Result<Tz, TimezoneError> {
    tz_str
        .parse()
        .map_err(|_| TimezoneError::InvalidTimezone(tz_str.to_string()))
}

/// Parse a time string in HH:MM format (24-hour, minute precision)
pub fn parse_time_string(time_str: &str) -> Result<NaiveTime, TimezoneError> {
    // chrono accepts "8:00"; delivery times are stored zero-padded
    if time_str.len() != 5 || time_str.as_bytes()[2] != b':' {
        return Err(TimezoneError::InvalidTime(format!(
            "Expected HH:MM format, got '{}'",
            time_str
        )));
    }
    NaiveTime::parse_from_str(time_str, "%H:%M").map_err(|_| {
        TimezoneError::InvalidTime(format!("Expected HH:MM format, got '{}'", time_str))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_time_string() {
        assert!(parse_time_string("08:00").is_ok());
        assert!(parse_time_string("23:59").is_ok());
        assert!(parse_time_string("00:00").is_ok());
        assert!(parse_time_string("24:00").is_err());
        assert!(parse_time_string("8:00").is_err());
        assert!(parse_time_string("08:60").is_err());
        assert!(parse_time_string("invalid").is_err());
    }

    #[test]
    fn test_parse_time_string_components() {
        let time = parse_time_string("15:30").unwrap();
        assert_eq!(time.hour(), 15);
        assert_eq!(time.minute(), 30);
    }

    #[test]
    fn test_parse_timezone() {
        assert!(parse_timezone("UTC").is_ok());
        assert!(parse_timezone("Europe/Paris").is_ok());
        assert!(parse_timezone("America/Chicago").is_ok());
        assert!(parse_timezone("Invalid/Timezone").is_err());
    }
}

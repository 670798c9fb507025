//! Timecode parsing.

use thiserror::Error;

/// Error for malformed timecode strings.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid timecode format: {0}")]
pub struct TimecodeError(pub String);

/// Parse a `HH:MM:SS` or `HH:MM:SS.mmm` timecode to seconds.
pub fn parse_timecode(ts: &str) -> Result<f64, TimecodeError> {
    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() != 3 {
        return Err(TimecodeError(ts.to_string()));
    }

    let hours: f64 = parts[0]
        .parse()
        .map_err(|_| TimecodeError(ts.to_string()))?;
    let minutes: f64 = parts[1]
        .parse()
        .map_err(|_| TimecodeError(ts.to_string()))?;
    let seconds: f64 = parts[2]
        .parse()
        .map_err(|_| TimecodeError(ts.to_string()))?;

    if hours < 0.0 || !(0.0..60.0).contains(&minutes) || !(0.0..60.0).contains(&seconds) {
        return Err(TimecodeError(ts.to_string()));
    }

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timecode() {
        assert!((parse_timecode("00:00:00").unwrap()).abs() < 0.001);
        assert!((parse_timecode("00:01:00").unwrap() - 60.0).abs() < 0.001);
        assert!((parse_timecode("01:00:00").unwrap() - 3600.0).abs() < 0.001);
        assert!((parse_timecode("00:00:30.500").unwrap() - 30.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_timecode("90").is_err());
        assert!(parse_timecode("00:90:00").is_err());
        assert!(parse_timecode("00:00:75").is_err());
        assert!(parse_timecode("aa:bb:cc").is_err());
        assert!(parse_timecode("00:00").is_err());
    }
}

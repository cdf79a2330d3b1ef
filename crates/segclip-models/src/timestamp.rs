//! Time-string conversion.
//!
//! Gemini reports segment boundaries as `MM:SS` (or occasionally
//! `HH:MM:SS`) literals; ffmpeg wants seconds.

use crate::error::{ModelError, ModelResult};

/// Convert a `MM:SS` or `HH:MM:SS` literal to total seconds.
///
/// The last field may be fractional (`00:12.5`). Any other field count
/// or a non-numeric field is an error.
pub fn time_to_seconds(time_str: &str) -> ModelResult<f64> {
    let parts: Vec<&str> = time_str.split(':').collect();

    let invalid = || ModelError::InvalidTimeFormat(time_str.to_string());

    if parts.len() < 2 || parts.len() > 3 {
        return Err(invalid());
    }

    // All fields but the last are whole numbers
    let mut lead = [0u32; 2];
    for (slot, part) in lead.iter_mut().zip(&parts[..parts.len() - 1]) {
        *slot = part.parse().map_err(|_| invalid())?;
    }

    let seconds: f64 = parts[parts.len() - 1].parse().map_err(|_| invalid())?;

    Ok(if parts.len() == 2 {
        f64::from(lead[0]) * 60.0 + seconds
    } else {
        f64::from(lead[0]) * 3600.0 + f64::from(lead[1]) * 60.0 + seconds
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mm_ss() {
        assert_eq!(time_to_seconds("02:05").unwrap(), 125.0);
        assert_eq!(time_to_seconds("00:00").unwrap(), 0.0);
        assert_eq!(time_to_seconds("53:53").unwrap(), 3233.0);
    }

    #[test]
    fn test_hh_mm_ss() {
        assert_eq!(time_to_seconds("01:02:03").unwrap(), 3723.0);
        assert_eq!(time_to_seconds("01:30:00").unwrap(), 5400.0);
    }

    #[test]
    fn test_single_field_rejected() {
        // Colon-free literals are not a timestamp format
        assert!(matches!(
            time_to_seconds("90"),
            Err(ModelError::InvalidTimeFormat(_))
        ));
    }

    #[test]
    fn test_fractional_seconds() {
        let secs = time_to_seconds("00:12.5").unwrap();
        assert!((secs - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_inputs() {
        for bad in ["", "90", "1:2:3:4", "abc:00", "00:xy", ":"] {
            assert!(
                matches!(time_to_seconds(bad), Err(ModelError::InvalidTimeFormat(_))),
                "expected failure for {bad:?}"
            );
        }
    }
}

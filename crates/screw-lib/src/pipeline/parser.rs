//! Delimited-text series parsing
//!
//! Turns the free-form time and value texts entered by the user into a
//! [`TimeSeries`]. Failure is part of the return type; nothing here panics.

use crate::error::{Channel, ParseError};
use crate::models::TimeSeries;

/// Token separator for both time and value texts
const SEPARATOR: char = ',';

/// Parse comma-separated timestamps and values into one series.
///
/// Every token must be a float. Token counts must match; a mismatch is
/// an error rather than a truncated pairing.
pub fn parse_series(time_text: &str, value_text: &str) -> Result<TimeSeries, ParseError> {
    let timestamps = parse_channel(time_text, Channel::Time)?;
    let values = parse_channel(value_text, Channel::Value)?;
    TimeSeries::new(timestamps, values)
}

fn parse_channel(text: &str, channel: Channel) -> Result<Vec<f64>, ParseError> {
    text.trim()
        .split(SEPARATOR)
        .enumerate()
        .map(|(position, raw)| {
            let token = raw.trim();
            if token.is_empty() {
                return Err(ParseError::EmptyToken { channel, position });
            }
            token.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
                channel,
                position,
                token: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_reference_input() {
        let series = parse_series("0.0,0.001", "0.1,0.2").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.timestamps(), &[0.0, 0.001]);
        assert_eq!(series.values(), &[0.1, 0.2]);
    }

    #[test]
    fn test_empty_input_is_invalid() {
        assert_eq!(
            parse_series("", ""),
            Err(ParseError::EmptyToken {
                channel: Channel::Time,
                position: 0
            })
        );
        assert!(parse_series("   ", "1").is_err());
    }

    #[test]
    fn test_non_numeric_token_is_invalid() {
        assert_eq!(
            parse_series("a,b", "1,2"),
            Err(ParseError::InvalidNumber {
                channel: Channel::Time,
                position: 0,
                token: "a".to_string()
            })
        );
        assert!(matches!(
            parse_series("0,1", "1,x"),
            Err(ParseError::InvalidNumber {
                channel: Channel::Value,
                position: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_mismatched_lengths_are_invalid() {
        assert_eq!(
            parse_series("0.0,0.001,0.002", "0.1,0.2"),
            Err(ParseError::LengthMismatch {
                timestamps: 3,
                values: 2
            })
        );
    }

    #[test]
    fn test_trailing_or_doubled_separator_is_invalid() {
        assert!(matches!(
            parse_series("0,1,", "1,2,3"),
            Err(ParseError::EmptyToken { position: 2, .. })
        ));
        assert!(matches!(
            parse_series("0,,1", "1,2,3"),
            Err(ParseError::EmptyToken { position: 1, .. })
        ));
    }

    #[test]
    fn test_whitespace_around_tokens_is_ignored() {
        let series = parse_series("  0.0 , 0.5,1  ", "\t2.5, 5.25 ,6.25 ").unwrap();
        assert_eq!(series.timestamps(), &[0.0, 0.5, 1.0]);
        assert_eq!(series.values(), &[2.5, 5.25, 6.25]);
    }

    #[test]
    fn test_unsorted_and_duplicate_timestamps_are_kept() {
        let series = parse_series("0.2,0.1,0.1", "1,2,3").unwrap();
        assert_eq!(series.timestamps(), &[0.2, 0.1, 0.1]);
    }

    #[test]
    fn test_formatted_floats_parse_back_exactly() {
        let values = [0.1, -3.75, 1e-9, 12345.678, f64::MAX, 0.30000000000000004];
        let timestamps: Vec<f64> = (0..values.len()).map(|i| i as f64 * 0.001).collect();
        let join = |xs: &[f64]| {
            xs.iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };

        let series = parse_series(&join(&timestamps), &join(&values)).unwrap();
        assert_eq!(series.len(), values.len());
        assert_eq!(series.values(), &values);
        assert_eq!(series.timestamps(), timestamps.as_slice());
    }

    #[test]
    fn test_single_sample_series() {
        let series = parse_series("0", "0").unwrap();
        assert_eq!(series.len(), 1);
    }
}

// Race Event Module
// Parses one line of a race file into a structured event.

use chrono::NaiveTime;
use serde_json::{Map, Value};
use std::fmt;

/// Field separator used in race files
pub const FIELD_DELIMITER: char = ';';

/// Number of fields in a race file line
const FIELD_COUNT: usize = 4;

/// Accepted time-of-day layouts, tried in order
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Classification of a race event, which decides the destination endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    /// Ordinary telemetry, sent to the data endpoint
    Data,
    /// Exceptional condition, sent to the alert endpoint
    Alert,
    /// Any other label. Routed like an alert.
    Other(String),
}

impl EventType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "data" => EventType::Data,
            "alert" => EventType::Alert,
            other => EventType::Other(other.to_string()),
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, EventType::Data)
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventType::Data => "data",
            EventType::Alert => "alert",
            EventType::Other(label) => label,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timestamped event from a race file
#[derive(Debug, Clone, PartialEq)]
pub struct RaceEvent {
    /// Time of day the event happened (no date component)
    pub timestamp: NaiveTime,
    pub event_type: EventType,
    /// Identifier of the simulated device (URN)
    pub target_id: String,
    pub payload: Map<String, Value>,
}

impl RaceEvent {
    /// Parse a `timestamp;eventType;targetId;payloadJSON` line.
    ///
    /// The payload is the remainder of the line after the third delimiter,
    /// so it may itself contain `;`.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let fields: Vec<&str> = line.splitn(FIELD_COUNT, FIELD_DELIMITER).collect();
        if fields.len() < FIELD_COUNT {
            return Err(ParseError::MissingFields {
                found: fields.len(),
            });
        }

        let timestamp = parse_time_of_day(fields[0])?;
        let event_type = EventType::parse(fields[1].trim());
        let target_id = fields[2].trim().to_string();
        if target_id.is_empty() {
            return Err(ParseError::EmptyTarget);
        }

        let payload = match serde_json::from_str::<Value>(fields[3])? {
            Value::Object(map) => map,
            other => return Err(ParseError::PayloadNotObject(json_kind(&other))),
        };

        Ok(Self {
            timestamp,
            event_type,
            target_id,
            payload,
        })
    }
}

/// Decode a line together with the timestamp of the line before it.
///
/// `previous` is `None` for the first record of a timeline.
pub fn parse_record(
    line: &str,
    previous: Option<&str>,
) -> Result<(RaceEvent, Option<NaiveTime>), ParseError> {
    let event = RaceEvent::parse(line)?;
    let previous = previous
        .map(|prev| parse_time_of_day(prev.split(FIELD_DELIMITER).next().unwrap_or_default()))
        .transpose()?;
    Ok((event, previous))
}

/// Parse the leading timestamp field of a line
pub fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ParseError> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| ParseError::InvalidTimestamp(raw.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Errors raised while decoding a race file line
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("expected 4 ';'-separated fields, found {found}")]
    MissingFields { found: usize },
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
    #[error("empty target id")]
    EmptyTarget,
    #[error("invalid JSON payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error("payload must be a JSON object, got {0}")]
    PayloadNotObject(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_data_line() {
        let event = RaceEvent::parse(r#"10:00:00;data;car-1;{"speed":80}"#).unwrap();
        assert_eq!(event.timestamp, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(event.event_type, EventType::Data);
        assert_eq!(event.target_id, "car-1");
        assert_eq!(Value::Object(event.payload), json!({"speed": 80}));
    }

    #[test]
    fn test_parse_alert_line() {
        let event = RaceEvent::parse(r#"10:00:02;alert;car-1;{"code":5}"#).unwrap();
        assert_eq!(event.event_type, EventType::Alert);
        assert!(!event.event_type.is_data());
    }

    #[test]
    fn test_unknown_event_type_is_kept() {
        let event = RaceEvent::parse(r#"10:00:02;lap;car-2;{}"#).unwrap();
        assert_eq!(event.event_type, EventType::Other("lap".to_string()));
        assert_eq!(event.event_type.to_string(), "lap");
        assert!(!event.event_type.is_data());
    }

    #[test]
    fn test_payload_may_contain_delimiter() {
        let event = RaceEvent::parse(r#"10:00:00;data;car-1;{"note":"a;b"}"#).unwrap();
        assert_eq!(event.payload["note"], json!("a;b"));
    }

    #[test]
    fn test_fractional_and_short_timestamps() {
        let event = RaceEvent::parse(r#"10:00:00.250;data;car-1;{}"#).unwrap();
        assert_eq!(
            event.timestamp,
            NaiveTime::from_hms_milli_opt(10, 0, 0, 250).unwrap()
        );

        let time = parse_time_of_day("09:30").unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_record_with_predecessor() {
        let (event, previous) = parse_record(
            r#"10:00:02;alert;car-1;{"code":5}"#,
            Some(r#"10:00:00;data;car-1;{"speed":80}"#),
        )
        .unwrap();
        assert_eq!(event.target_id, "car-1");
        assert_eq!(previous, Some(NaiveTime::from_hms_opt(10, 0, 0).unwrap()));

        let (_, previous) = parse_record(r#"10:00:00;data;car-1;{}"#, None).unwrap();
        assert_eq!(previous, None);
    }

    #[test]
    fn test_missing_fields() {
        let err = RaceEvent::parse("10:00:00;data;car-1").unwrap_err();
        assert!(matches!(err, ParseError::MissingFields { found: 3 }));
    }

    #[test]
    fn test_invalid_json_payload() {
        let err = RaceEvent::parse("10:00:00;data;car-1;{speed:80}").unwrap_err();
        assert!(matches!(err, ParseError::InvalidPayload(_)));
    }

    #[test]
    fn test_non_object_payload() {
        let err = RaceEvent::parse("10:00:00;data;car-1;[1,2]").unwrap_err();
        assert!(matches!(err, ParseError::PayloadNotObject("array")));
    }

    #[test]
    fn test_invalid_timestamp() {
        let err = RaceEvent::parse("25:61:00;data;car-1;{}").unwrap_err();
        assert!(matches!(err, ParseError::InvalidTimestamp(_)));
        assert!(err.to_string().contains("25:61:00"));
    }

    #[test]
    fn test_empty_target() {
        let err = RaceEvent::parse("10:00:00;data; ;{}").unwrap_err();
        assert!(matches!(err, ParseError::EmptyTarget));
    }
}

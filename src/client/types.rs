use serde::Serialize;
use serde_json::{Map, Value};

use super::{DoorErr, DoorResult};

/// Width in bytes of a single power sample (`f64`).
pub const SAMPLE_WIDTH: usize = std::mem::size_of::<f64>();

pub const DEFAULT_TRACE_FIELD: &str = "tracedata";
pub const DEFAULT_VALUE_FIELD: &str = "data";
pub const DEFAULT_RESULT_FIELD: &str = "result";

/// Verdict string the server sends back when the guess matched.
pub const PASSWORD_CORRECT: &str = "Password correct";

/// Decoded power trace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace(Vec<f64>);

impl Trace {
    /// Decodes a hex-encoded buffer of little-endian `f64` samples.
    ///
    /// The buffer must decode to a whole number of samples; anything else is reported as
    /// `DoorErr::TraceLength` rather than silently dropping the trailing bytes.
    pub fn from_hex(encoded: &str) -> DoorResult<Self> {
        let bytes = hex::decode(encoded)?;
        if bytes.len() % SAMPLE_WIDTH != 0 {
            return Err(DoorErr::TraceLength(bytes.len()));
        }

        let samples = bytes
            .chunks_exact(SAMPLE_WIDTH)
            .map(|chunk| {
                let mut raw = [0u8; SAMPLE_WIDTH];
                raw.copy_from_slice(chunk);
                f64::from_le_bytes(raw)
            })
            .collect();

        Ok(Self(samples))
    }

    pub fn samples(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for Trace {
    fn from(samples: Vec<f64>) -> Self {
        Self(samples)
    }
}

/// A single capture returned by the door server.
///
/// The trace field is pulled out of the JSON body and decoded at parse time; every other field is
/// kept as-is in `fields`.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    pub trace: Option<Trace>,
    pub fields: Map<String, Value>,
}

impl Capture {
    /// Parses a response body, decoding the hex buffer held under `trace_field` (if any).
    pub fn parse(body: &[u8], trace_field: &str) -> DoorResult<Self> {
        let mut fields = match serde_json::from_slice::<Value>(body)? {
            Value::Object(map) => map,
            other => return Err(DoorErr::NotAnObject(other)),
        };

        let trace = match fields.remove(trace_field) {
            Some(Value::String(encoded)) => Some(Trace::from_hex(&encoded)?),
            Some(other) => {
                return Err(DoorErr::TraceField {
                    field: trace_field.to_string(),
                    found: other,
                });
            }
            None => None,
        };

        Ok(Self { trace, fields })
    }

    /// Returns a top-level string field.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Hex echo of the requested value.
    pub fn data(&self) -> Option<&str> {
        self.text(DEFAULT_VALUE_FIELD)
    }

    /// The server's verdict.
    pub fn result(&self) -> Option<&str> {
        self.text(DEFAULT_RESULT_FIELD)
    }

    pub fn is_correct(&self) -> bool {
        self.result() == Some(PASSWORD_CORRECT)
    }
}

/// Printable overview of a capture, without the (large) sample array.
#[derive(Debug, Serialize)]
pub struct CaptureSummary<'a> {
    pub fields: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<usize>,
    pub correct: bool,
}

impl<'a> From<&'a Capture> for CaptureSummary<'a> {
    fn from(capture: &'a Capture) -> Self {
        Self {
            fields: &capture.fields,
            samples: capture.trace.as_ref().map(Trace::len),
            correct: capture.is_correct(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn encode(samples: &[f64]) -> String {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        hex::encode(bytes)
    }

    #[test]
    fn test_trace_from_hex() {
        let samples = [0.0199, -0.5, 1.25, 1e-9];
        let encoded = encode(&samples);

        let trace = Trace::from_hex(&encoded).unwrap();
        assert_eq!(trace.len(), encoded.len() / 2 / SAMPLE_WIDTH);
        assert_eq!(trace.samples(), &samples);

        // decoding the same buffer again gives the same samples
        assert_eq!(Trace::from_hex(&encoded).unwrap(), trace);
    }

    #[test]
    fn test_trace_rejects_bad_payloads() {
        assert!(matches!(
            Trace::from_hex("0000000000"),
            Err(DoorErr::TraceLength(5))
        ));
        assert!(matches!(Trace::from_hex("zz"), Err(DoorErr::Hex(_))));
        assert!(Trace::from_hex("").unwrap().is_empty());
    }

    #[test]
    fn test_capture_parse() {
        let body = format!(
            r#"{{"data":"30303030","tracedata":"{}","result":"incorrect","elapsed":12}}"#,
            encode(&[1.0, 2.0])
        );

        let capture = Capture::parse(body.as_bytes(), DEFAULT_TRACE_FIELD).unwrap();
        assert_eq!(capture.trace.as_ref().unwrap().samples(), &[1.0, 2.0]);
        assert_eq!(capture.data(), Some("30303030"));
        assert_eq!(capture.result(), Some("incorrect"));
        assert_eq!(capture.fields["elapsed"], 12);
        assert!(!capture.fields.contains_key(DEFAULT_TRACE_FIELD));
    }

    #[test]
    fn test_capture_without_trace() {
        let body = br#"{"data":"30303030","result":"Password correct"}"#;

        let capture = Capture::parse(body, DEFAULT_TRACE_FIELD).unwrap();
        assert!(capture.trace.is_none());
        assert!(capture.is_correct());
        assert_eq!(capture.fields.len(), 2);
    }

    #[test]
    fn test_capture_summary() {
        let body = format!(
            r#"{{"data":"36303030","tracedata":"{}","result":"Password correct"}}"#,
            encode(&[1.0, 2.0, 3.0])
        );
        let capture = Capture::parse(body.as_bytes(), DEFAULT_TRACE_FIELD).unwrap();

        let summary = serde_json::to_value(CaptureSummary::from(&capture)).unwrap();
        assert_eq!(summary["samples"], 3);
        assert_eq!(summary["correct"], true);
        assert_eq!(summary["fields"]["data"], "36303030");
        assert!(summary["fields"].get(DEFAULT_TRACE_FIELD).is_none());

        let bare = Capture::parse(br#"{"data":"30"}"#, DEFAULT_TRACE_FIELD).unwrap();
        let summary = serde_json::to_value(CaptureSummary::from(&bare)).unwrap();
        assert!(summary.get("samples").is_none());
        assert_eq!(summary["correct"], false);
    }

    #[test]
    fn test_capture_parse_errors() {
        assert!(matches!(
            Capture::parse(b"<html>oops</html>", DEFAULT_TRACE_FIELD),
            Err(DoorErr::Json(_))
        ));
        assert!(matches!(
            Capture::parse(b"[1, 2]", DEFAULT_TRACE_FIELD),
            Err(DoorErr::NotAnObject(_))
        ));
        assert!(matches!(
            Capture::parse(br#"{"tracedata": 4}"#, DEFAULT_TRACE_FIELD),
            Err(DoorErr::TraceField { .. })
        ));
    }
}

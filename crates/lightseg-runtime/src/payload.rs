#![forbid(unsafe_code)]

//! Wire payload sent on every change and on explicit saves.
//!
//! The JSON shape is fixed by the light server:
//!
//! ```json
//! {
//!   "Metadata": { "CurLight": 17, "Mode": "ON" },
//!   "OnRanges": [ { "from": 3, "to": 9 }, { "from": 12, "to": 12 } ]
//! }
//! ```

use std::fmt;

use lightseg_core::interval::{Interval, IntervalSet, Point, SeedError};
use serde::{Deserialize, Serialize};

use crate::mode::ActionMode;

/// Errors decoding or validating a payload.
#[derive(Debug)]
pub enum PayloadError {
    /// The body is not valid JSON for an [`UpdateRequest`].
    Decode(serde_json::Error),
    /// The ranges are not in canonical form.
    Ranges(SeedError),
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadError::Decode(e) => write!(f, "failed to decode request: {e}"),
            PayloadError::Ranges(e) => write!(f, "invalid ranges: {e}"),
        }
    }
}

impl std::error::Error for PayloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PayloadError::Decode(e) => Some(e),
            PayloadError::Ranges(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(e: serde_json::Error) -> Self {
        PayloadError::Decode(e)
    }
}

impl From<SeedError> for PayloadError {
    fn from(e: SeedError) -> Self {
        PayloadError::Ranges(e)
    }
}

/// Cursor and mode at the time of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMetadata {
    #[serde(rename = "CurLight")]
    pub cur_light: Point,
    /// Mode label; kept as text so unknown labels still decode.
    #[serde(rename = "Mode")]
    pub mode: String,
}

/// Full session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(rename = "Metadata")]
    pub metadata: UpdateMetadata,
    #[serde(rename = "OnRanges")]
    pub on_ranges: Vec<Interval>,
}

impl UpdateRequest {
    /// Build a request from live session state.
    #[must_use]
    pub fn new(cursor: Point, mode: ActionMode, set: &IntervalSet) -> Self {
        Self {
            metadata: UpdateMetadata {
                cur_light: cursor,
                mode: mode.label().to_owned(),
            },
            on_ranges: set.to_transport(),
        }
    }

    /// The cursor position.
    #[must_use]
    pub fn cursor(&self) -> Point {
        self.metadata.cur_light
    }

    /// The parsed mode, or `None` for a label this build does not know.
    #[must_use]
    pub fn mode(&self) -> Option<ActionMode> {
        ActionMode::parse(&self.metadata.mode)
    }

    /// Rebuild the interval set, rejecting non-canonical ranges.
    pub fn intervals(&self) -> Result<IntervalSet, PayloadError> {
        Ok(IntervalSet::from_seed(self.on_ranges.clone())?)
    }

    /// Compact JSON encoding.
    pub fn to_json(&self) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON bytes.
    pub fn from_json(body: &[u8]) -> Result<Self, PayloadError> {
        serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "failed to decode update request");
            PayloadError::Decode(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UpdateRequest {
        let set = IntervalSet::from_seed(vec![Interval::new(3, 9), Interval::new(12, 12)]).unwrap();
        UpdateRequest::new(17, ActionMode::On, &set)
    }

    #[test]
    fn encodes_server_field_names() {
        let json = sample().to_json().unwrap();
        assert_eq!(
            json,
            r#"{"Metadata":{"CurLight":17,"Mode":"ON"},"OnRanges":[{"from":3,"to":9},{"from":12,"to":12}]}"#
        );
    }

    #[test]
    fn decodes_back() {
        let req = sample();
        let back = UpdateRequest::from_json(req.to_json().unwrap().as_bytes()).unwrap();
        assert_eq!(back, req);
        assert_eq!(back.cursor(), 17);
        assert_eq!(back.mode(), Some(ActionMode::On));
        assert_eq!(back.intervals().unwrap().to_string(), "3-9, 12");
    }

    #[test]
    fn unknown_mode_decodes_as_none() {
        let body = br#"{"Metadata":{"CurLight":0,"Mode":"DANCE"},"OnRanges":[]}"#;
        let req = UpdateRequest::from_json(body).unwrap();
        assert_eq!(req.mode(), None);
        assert!(req.intervals().unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let err = UpdateRequest::from_json(b"{not json").unwrap_err();
        assert!(matches!(err, PayloadError::Decode(_)));
        assert!(err.to_string().starts_with("failed to decode request"));
    }

    #[test]
    fn overlapping_ranges_rejected() {
        let body = br#"{"Metadata":{"CurLight":0,"Mode":"NAV"},"OnRanges":[{"from":1,"to":5},{"from":4,"to":8}]}"#;
        let req = UpdateRequest::from_json(body).unwrap();
        assert!(matches!(
            req.intervals(),
            Err(PayloadError::Ranges(SeedError::Overlapping { index: 1 }))
        ));
    }
}

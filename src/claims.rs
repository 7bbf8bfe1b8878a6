use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Map;
use serde_json::Value;

use crate::error::Error;
use crate::error::Result;

/// A JSON object decoded from one token segment
pub type ClaimSet = Map<String, Value>;

/// The token segment an encoding or schema error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Header,
    Payload,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Header => f.write_str("header"),
            Segment::Payload => f.write_str("payload"),
        }
    }
}

/// Header and payload of a compact JWT, decoded without any signature check
///
/// Claims are kept as dynamic JSON maps: claim sets differ between issuers and
/// token versions, so unknown keys are carried along instead of rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedClaims {
    pub header: ClaimSet,
    pub payload: ClaimSet,
    /// The token exactly as it was handed to [`DecodedClaims::decode`]
    pub raw: String,
}

impl DecodedClaims {
    /// Decode the header and payload segments of `token`
    ///
    /// Only the first two dot-delimited segments are looked at. The signature,
    /// if present, is neither decoded nor verified.
    pub fn decode(token: &str) -> Result<Self> {
        let mut parts = token.split('.');
        let (header, payload) = match (parts.next(), parts.next()) {
            (Some(header), Some(payload)) => (header, payload),
            _ => return Err(Error::MalformedToken),
        };

        let header_raw = decode_segment(header, Segment::Header)?;
        let payload_raw = decode_segment(payload, Segment::Payload)?;

        Ok(Self {
            header: parse_segment(&header_raw, Segment::Header)?,
            payload: parse_segment(&payload_raw, Segment::Payload)?,
            raw: token.to_string(),
        })
    }

    /// Get a string-valued claim from the payload
    pub fn payload_str(&self, claim: &str) -> Option<&str> {
        self.payload.get(claim).and_then(Value::as_str)
    }
}

/// Shorthand for [`DecodedClaims::decode`]
pub fn decode(token: &str) -> Result<DecodedClaims> {
    DecodedClaims::decode(token)
}

fn decode_segment(segment: &str, which: Segment) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|source| Error::Encoding {
            segment: which,
            source,
        })
}

fn parse_segment(bytes: &[u8], which: Segment) -> Result<ClaimSet> {
    serde_json::from_slice(bytes).map_err(|source| Error::Schema {
        segment: which,
        source,
    })
}

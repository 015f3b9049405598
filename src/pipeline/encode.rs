//! Base64 on both edges of the pipeline: request payload in, PNG pages out.
//!
//! Outgoing images use the standard alphabet with padding. Incoming payloads
//! are decoded leniently with respect to layout: line breaks and other ASCII
//! whitespace (common when clients wrap base64 at 76 columns) are ignored and
//! trailing padding is optional. Anything else outside the standard alphabet
//! is rejected.

use crate::error::ConvertError;
use base64::{
    alphabet,
    engine::{general_purpose::STANDARD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use tracing::debug;

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode a PNG file's bytes for the JSON response.
pub fn encode_image(png: &[u8]) -> String {
    let b64 = STANDARD.encode(png);
    debug!("Encoded image → {} bytes base64", b64.len());
    b64
}

/// Decode a base64 request payload into raw bytes.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, ConvertError> {
    let compact: Vec<u8> = payload
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(LENIENT.decode(compact)?)
}

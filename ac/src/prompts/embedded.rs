//! Embedded prompts
//!
//! Compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Ad copy generation prompt
pub const AD_COPY: &str = include_str!("../../prompts/ad-copy.pmt");

/// System message sent with every generation prompt
pub const SYSTEM_MESSAGE: &str = "You are an expert Google Ads copywriter. You always answer with a single valid JSON object containing \"titles\" and \"descriptions\" arrays and never exceed the character limits you are given.";

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "ad-copy" => {
            debug!("get_embedded: matched ad-copy");
            Some(AD_COPY)
        }
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

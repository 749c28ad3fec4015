//! Brand allow-list.
//!
//! Each brand selects one `{brand}-places.json` input file.

use crate::error::{PipelineError, Result};

/// Column holding the brand each record was loaded from
pub const BRAND_COLUMN: &str = "brand";

/// Brands accepted by the loader
pub const ALLOWED_BRANDS: &[&str] = &["ah", "jumbo", "lidl", "plus", "aldi"];

/// Validate a brand name against the allow-list
///
/// The name is trimmed and compared case-insensitively; the canonical
/// lowercase spelling from the allow-list is returned.
pub fn validate_brand(name: &str) -> Result<&'static str> {
    let wanted = name.trim().to_lowercase();
    ALLOWED_BRANDS
        .iter()
        .copied()
        .find(|brand| *brand == wanted)
        .ok_or_else(|| PipelineError::InvalidBrand {
            brand: name.to_string(),
            allowed: ALLOWED_BRANDS.iter().map(|b| (*b).to_string()).collect(),
        })
}

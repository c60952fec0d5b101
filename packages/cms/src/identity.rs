//! Lookup normalization for the authentication layer.

/// Normalizes user names and e-mail addresses before they are used as
/// lookup keys.
pub trait LookupNormalizer: Send + Sync {
    fn normalize_name(&self, name: Option<&str>) -> Option<String>;
    fn normalize_email(&self, email: Option<&str>) -> Option<String>;
}

/// Leaves keys untouched; user lookups already compare case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughNormalizer;

impl LookupNormalizer for PassThroughNormalizer {
    fn normalize_name(&self, name: Option<&str>) -> Option<String> {
        name.map(str::to_owned)
    }

    fn normalize_email(&self, email: Option<&str>) -> Option<String> {
        email.map(str::to_owned)
    }
}

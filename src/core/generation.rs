use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Write-once token identifying one batch of element registrations.
///
/// It is carried for provenance and diagnostics only; lookups never look at
/// it.
///
/// # Examples
///
/// ```
/// use xml_binding_rs::core::generation::GenerationId;
///
/// let id: GenerationId = "urn:uuid:b4ece584-ab54-11e3-bd08-c4d98710dc86".parse().unwrap();
/// assert_eq!(id.to_string(), "urn:uuid:b4ece584-ab54-11e3-bd08-c4d98710dc86");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationId(Uuid);

impl GenerationId {
    /// Mints a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.urn())
    }
}

impl FromStr for GenerationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

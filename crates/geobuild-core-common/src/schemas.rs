//! Object-schema descriptors for the geoscience object types the builders
//! know about, together with their current support status. The static
//! registry itself lives in `geobuild-core`.

/// Support status of an object type.
///
/// Indicates whether objects of a type can currently be built or are only
/// planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// The object type can be built and projected.
    Supported,
    /// The object type is planned for future implementation.
    Planned,
}

impl SupportStatus {
    /// Returns `true` if the type is fully supported and implemented.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }

    /// Returns the string representation of this support status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SupportStatus::Supported => "Supported",
            SupportStatus::Planned => "Planned",
        }
    }
}

/// Registry entry describing one object type and the schema its payloads
/// conform to.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    /// Short name used in requests and on the CLI (e.g. `"pointset"`).
    pub short_name: &'static str,
    /// Descriptive name for display purposes.
    pub long_name: &'static str,
    /// Schema identifier attached to projected payloads, when one is registered.
    pub schema_id: Option<&'static str>,
    /// Whether builds of this type are possible.
    pub status: SupportStatus,
}

impl ObjectSchema {
    /// Creates a new registry entry.
    #[must_use]
    pub const fn new(
        short_name: &'static str,
        long_name: &'static str,
        schema_id: Option<&'static str>,
        status: SupportStatus,
    ) -> Self {
        Self {
            short_name,
            long_name,
            schema_id,
            status,
        }
    }

    /// Schema id, but only for types that can actually be built.
    #[must_use]
    pub fn registered_schema_id(&self) -> Option<&'static str> {
        if self.status.is_supported() {
            self.schema_id
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_status_predicates() {
        assert!(SupportStatus::Supported.is_supported());
        assert!(!SupportStatus::Planned.is_supported());
        assert_eq!(SupportStatus::Supported.as_str(), "Supported");
        assert_eq!(SupportStatus::Planned.as_str(), "Planned");
    }

    #[test]
    fn test_planned_schema_has_no_registered_id() {
        let planned = ObjectSchema::new(
            "triangle-mesh",
            "Triangle mesh",
            Some("/objects/triangle-mesh/2.1.0/triangle-mesh.schema.json"),
            SupportStatus::Planned,
        );
        assert_eq!(planned.registered_schema_id(), None);
    }
}

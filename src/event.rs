//! Error/exception event records as reported by the analytics service

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hit and invocation counters for one event in the active window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStats {
    pub hits: u64,
    pub invocations: u64,
}

/// One observed error signature in a time window
///
/// All identity fields are optional; any subset may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Service-side event id, used for partition membership and deep links
    pub id: String,

    /// Event kind (e.g. "Logged Error", "Uncaught Exception")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_origin: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_location: Option<String>,

    /// Exception class name; matched against critical exception types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_stack_group: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<EventStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduced_by: Option<String>,

    /// Extra fields carried through for link rendering and presentation
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl EventRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Hit count, 0 when the service sent no stats
    pub fn hits(&self) -> u64 {
        self.stats.map(|s| s.hits).unwrap_or(0)
    }

    pub fn invocations(&self) -> u64 {
        self.stats.map(|s| s.invocations).unwrap_or(0)
    }

    /// Composite key deciding whether two records are the same logical error
    pub fn identity(&self) -> EventIdentity<'_> {
        EventIdentity {
            event_type: self.event_type.as_deref(),
            error_origin: self.error_origin.as_deref(),
            error_location: self.error_location.as_deref(),
            name: self.name.as_deref(),
            call_stack_group: self.call_stack_group.as_deref(),
        }
    }

    /// Canonical JSON text of identity and stats, the subject of regex filtering
    pub fn canonical_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Whether the exception name is one of `types`
    pub fn has_exception_type(&self, types: &[String]) -> bool {
        match &self.name {
            Some(name) => types.iter().any(|t| t == name),
            None => false,
        }
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("<unnamed>");
        match &self.error_location {
            Some(location) => write!(f, "{} in {}", name, location)?,
            None => write!(f, "{}", name)?,
        }
        write!(f, " (id {}, {} hits)", self.id, self.hits())
    }
}

/// Identity key: type, origin, location, name and call-stack group
///
/// Absent fields compare equal to each other and unequal to any present
/// value; they are never wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventIdentity<'a> {
    pub event_type: Option<&'a str>,
    pub error_origin: Option<&'a str>,
    pub error_location: Option<&'a str>,
    pub name: Option<&'a str>,
    pub call_stack_group: Option<&'a str>,
}

//! Regex filtering of events by their canonical text
//!
//! An event the filter rejects is dropped before aggregation: it does not
//! count towards volume, uniqueness, gates or any report list.

use crate::error::Result;
use crate::event::EventRecord;
use regex::Regex;

/// Event filter that determines which events take part in the report
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Pattern searched in the canonical text (None = all events)
    pattern: Option<Regex>,
}

impl EventFilter {
    /// Create a filter that admits every event
    pub fn all() -> Self {
        Self { pattern: None }
    }

    /// Compile a filter expression; empty or absent means no filtering
    ///
    /// A malformed pattern is an error, never a silent fallback to `all()`.
    pub fn from_expr(expr: Option<&str>) -> Result<Self> {
        match expr {
            None | Some("") => Ok(Self::all()),
            Some(expr) => Ok(Self {
                pattern: Some(Regex::new(expr)?),
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        self.pattern.is_some()
    }

    /// Check if an event survives the filter (unanchored search)
    pub fn allows(&self, event: &EventRecord) -> bool {
        match &self.pattern {
            None => true,
            Some(pattern) => pattern.is_match(&event.canonical_text()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GateError;

    fn event(name: &str, location: &str) -> EventRecord {
        EventRecord {
            id: "1".to_string(),
            name: Some(name.to_string()),
            error_location: Some(location.to_string()),
            ..EventRecord::default()
        }
    }

    #[test]
    fn test_filter_all_allows_everything() {
        let filter = EventFilter::all();
        assert!(!filter.is_active());
        assert!(filter.allows(&event("IOException", "Disk.read")));
        assert!(filter.allows(&EventRecord::default()));
    }

    #[test]
    fn test_empty_expression_is_no_filter() {
        assert!(!EventFilter::from_expr(Some("")).unwrap().is_active());
        assert!(!EventFilter::from_expr(None).unwrap().is_active());
    }

    #[test]
    fn test_filter_matches_name() {
        let filter = EventFilter::from_expr(Some("IOException")).unwrap();
        assert!(filter.allows(&event("IOException", "Disk.read")));
        assert!(!filter.allows(&event("TimeoutException", "Client.call")));
    }

    #[test]
    fn test_filter_matches_anywhere_in_text() {
        // Unanchored: location text matches too
        let filter = EventFilter::from_expr(Some(r"Disk\.")).unwrap();
        assert!(filter.allows(&event("IOException", "Disk.read")));
        assert!(!filter.allows(&event("IOException", "Net.read")));
    }

    #[test]
    fn test_filter_sees_stats() {
        let mut hot = event("IOException", "Disk.read");
        hot.stats = Some(crate::event::EventStats {
            hits: 1000,
            invocations: 2000,
        });
        let filter = EventFilter::from_expr(Some(r#""hits":\d{4}"#)).unwrap();
        assert!(filter.allows(&hot));
        assert!(!filter.allows(&event("IOException", "Disk.read")));
    }

    #[test]
    fn test_invalid_expression() {
        let result = EventFilter::from_expr(Some("[unclosed"));
        assert!(matches!(result, Err(GateError::FilterCompile(_))));
    }

    #[test]
    fn test_as_str_round_trips_expression() {
        let filter = EventFilter::from_expr(Some("Foo|Bar")).unwrap();
        assert_eq!(filter.as_str(), Some("Foo|Bar"));
        assert_eq!(EventFilter::all().as_str(), None);
    }
}

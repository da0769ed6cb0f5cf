//! Candidate location (grid point) supplied by the location store

use serde::{Deserialize, Serialize};

use crate::value_objects::{GeoLocation, LocationId};

/// A location that can be resolved and scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLocation {
    pub id: LocationId,
    pub location: GeoLocation,
    /// Display name, when geocoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Administrative region tags (state, county, ...)
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CandidateLocation {
    #[must_use]
    pub const fn new(id: LocationId, location: GeoLocation) -> Self {
        Self {
            id,
            location,
            name: None,
            tags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Case-insensitive region tag match
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.tags.iter().any(|t| t.trim().eq_ignore_ascii_case(tag))
    }
}

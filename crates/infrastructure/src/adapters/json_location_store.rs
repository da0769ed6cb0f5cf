//! Location store backed by a JSON file of grid points

use std::collections::HashSet;
use std::path::Path;

use application::{ApplicationError, LocationStorePort};
use async_trait::async_trait;
use domain::{CandidateLocation, DomainError, GeoLocation, LocationId};
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, instrument};

/// One grid point as written in the file
#[derive(Debug, Deserialize)]
struct RawLocation {
    id: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl TryFrom<RawLocation> for CandidateLocation {
    type Error = DomainError;

    fn try_from(raw: RawLocation) -> Result<Self, Self::Error> {
        let location = GeoLocation::new(raw.latitude, raw.longitude)?;
        Ok(Self {
            id: LocationId::new(raw.id)?,
            location,
            name: raw.name,
            tags: raw.tags,
        })
    }
}

/// Candidate locations loaded once from a JSON array
///
/// ```json
/// [{"id": "co-denver", "latitude": 39.74, "longitude": -104.99, "tags": ["colorado"]}]
/// ```
#[derive(Debug, Clone)]
pub struct JsonLocationStore {
    locations: Vec<CandidateLocation>,
}

impl JsonLocationStore {
    /// Read and validate the file at `path`
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ApplicationError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).await.map_err(|e| {
            ApplicationError::Configuration(format!(
                "Failed to read locations file {}: {e}",
                path.display()
            ))
        })?;
        let store = Self::from_json(&text)?;
        debug!(path = %path.display(), count = store.len(), "Loaded candidate locations");
        Ok(store)
    }

    /// Parse and validate a JSON array of grid points
    ///
    /// Invalid coordinates, unusable ids and duplicate ids are rejected.
    pub fn from_json(text: &str) -> Result<Self, ApplicationError> {
        let raw: Vec<RawLocation> = serde_json::from_str(text).map_err(|e| {
            ApplicationError::Configuration(format!("Invalid locations JSON: {e}"))
        })?;

        let mut seen = HashSet::new();
        let mut locations = Vec::with_capacity(raw.len());
        for entry in raw {
            let candidate = CandidateLocation::try_from(entry)?;
            if !seen.insert(candidate.id.clone()) {
                return Err(ApplicationError::Configuration(format!(
                    "Duplicate location id: {}",
                    candidate.id
                )));
            }
            locations.push(candidate);
        }

        Ok(Self { locations })
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

#[async_trait]
impl LocationStorePort for JsonLocationStore {
    #[instrument(skip(self))]
    async fn list(&self, region: Option<&str>) -> Result<Vec<CandidateLocation>, ApplicationError> {
        let region = region.map(str::trim).filter(|r| !r.is_empty());
        Ok(match region {
            Some(region) => self
                .locations
                .iter()
                .filter(|l| l.has_tag(region))
                .cloned()
                .collect(),
            None => self.locations.clone(),
        })
    }
}

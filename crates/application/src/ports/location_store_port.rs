//! Location store port
//!
//! Read-only access to the pre-enumerated grid points that a search ranks.

use async_trait::async_trait;
use domain::CandidateLocation;

use crate::error::ApplicationError;

/// Port for listing candidate locations
#[async_trait]
pub trait LocationStorePort: Send + Sync {
    /// List candidates, optionally restricted to one region tag
    ///
    /// Region matching is case-insensitive.
    async fn list(&self, region: Option<&str>) -> Result<Vec<CandidateLocation>, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn LocationStorePort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn LocationStorePort>();
    }
}

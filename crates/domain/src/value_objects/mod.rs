//! Value Objects - Immutable, identity-less domain primitives

mod data_class;
mod date_range;
mod freshness;
mod geo_location;
mod location_id;
mod percentage;
mod precipitation_type;

pub use data_class::{DataClass, Provenance};
pub use date_range::{DateRange, same_day_in_year};
pub use freshness::FreshnessPolicy;
pub use geo_location::{GeoLocation, InvalidCoordinates};
pub use location_id::LocationId;
pub use percentage::{InvalidPercentage, Percentage};
pub use precipitation_type::PrecipitationType;

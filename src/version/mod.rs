//! Version ordering and range evaluation shared by all ecosystems

mod compare;
mod range;
mod requirement;

pub use compare::{
    compare_versions, is_prerelease_version, major_version, numeric_parts, strip_version_noise,
};
pub use range::{parse_nuget_interval, Bound, VersionRange};
pub use requirement::Requirement;

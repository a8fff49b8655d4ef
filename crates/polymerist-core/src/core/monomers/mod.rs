pub mod group;

pub use group::{EndGroupPosition, MonomerError, MonomerGroup};

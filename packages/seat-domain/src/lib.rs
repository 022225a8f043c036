pub mod balance;
pub mod dbscan;
pub mod group;
pub mod incremental;
pub mod outliers;
pub mod participant;
pub mod partition;
pub mod profile;
pub mod similarity;

mod error;

pub use error::{Error, Result};
pub use group::Group;
pub use participant::{ExperienceLevel, Participant, Preferences};
pub use profile::GroupProfile;

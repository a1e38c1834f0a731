//! Catalogs of NEXRAD objects in the public AWS buckets.
//!
//! An [`AwsNexradDataProvider`] keeps a time index of the Level II volumes or
//! Level III products published for one radar site, refreshes it from an
//! [`ObjectSource`] and loads objects through the `wsr88d-parser` file
//! factory.

pub mod catalog;
pub mod config;
pub mod layout;
pub mod products;
pub mod scheduler;
pub mod source;

pub use catalog::{AwsNexradDataProvider, ObjectRecord};
pub use config::ProviderConfig;
pub use layout::KeyLayout;
pub use products::ProductCache;
pub use scheduler::RefreshScheduler;
pub use source::{ListOutput, MemoryObjectSource, ObjectSource, ObjectSummary, S3ObjectSource};

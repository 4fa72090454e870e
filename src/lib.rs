pub mod cli;
pub mod config;
pub mod discovery;
pub mod fetcher;
pub mod report;
pub mod roster;
pub mod runner;
pub mod session;

pub use discovery::{DiscoveryError, DownloadLink};
pub use roster::{Category, ClassifiedRoster, ReferenceIds, Relationship, RosterError};
pub use session::{Credentials, PortalSession};

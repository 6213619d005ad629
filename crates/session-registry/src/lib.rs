//! # Session Registry
//!
//! In-memory, TTL-bounded map from opaque bearer tokens to caller-supplied
//! credentials. Expiry is checked on every read and enforced eagerly by a
//! background sweep.

pub mod clock;
pub mod config;
pub mod entry;
pub mod registry;
pub mod sweeper;
pub mod token;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RegistryConfig, DEFAULT_SWEEP_INTERVAL_SECONDS, DEFAULT_TTL_SECONDS};
pub use entry::{is_expired, Session};
pub use registry::SessionRegistry;
pub use sweeper::SweeperHandle;
pub use token::SessionToken;

//! Persistence layer (string key-value store).

pub mod store;

pub use store::LocalStore;

/// Storage keys as constants.
pub mod keys {
    /// JSON array of every portal record
    pub const PORTALS: &str = "portals";
}

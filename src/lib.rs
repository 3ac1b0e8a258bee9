pub mod config;
pub mod error;
pub mod feed;
pub mod ideas;
pub mod models;
pub mod moderation;
pub mod repo;
pub mod routes;
pub mod security;
pub mod session;
pub mod tags;
pub mod views;
pub mod votes;

// Re-export commonly used items for tests / external users
pub use routes::{config, AppState};
pub use security::SecurityHeaders;
pub use session::{MarkerStore, Session, SessionConfig, VoteMarker};

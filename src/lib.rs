pub mod auth;
pub mod config;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod routes;
pub mod services;
pub mod state;

// Re-export AppState for convenience
pub use state::AppState;

// Mocks and router builders shared by unit and integration tests.
pub mod test_helpers;

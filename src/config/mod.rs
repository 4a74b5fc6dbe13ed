/// Database connection and versioned schema migrations
pub mod database;

/// Application settings and seed catalogue loaded from config.toml
pub mod settings;

pub mod config;
pub mod error;
pub mod export;
pub mod game_builder;
pub mod http_cache;
pub mod http_client;
pub mod loader;
pub mod match_scores;
pub mod model;
pub mod preamble;
pub mod reporter;
pub mod scrape;
pub mod statistics;
pub mod store;
pub mod token;

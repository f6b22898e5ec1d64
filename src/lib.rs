pub mod artifact;
pub mod bet_book;
pub mod config;
pub mod debounce;
pub mod export;
pub mod fake_rows;
pub mod http_cache;
pub mod http_client;
pub mod margin;
pub mod markup;
pub mod outcome;
pub mod presets;
pub mod query;
pub mod schema;
pub mod state;
pub mod transform;

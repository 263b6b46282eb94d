pub mod loader_config;

pub use loader_config::{KolboardConfig, LoaderConfig, TableConfig};

pub mod api_connection;
pub mod cli;
pub mod config;
pub mod error;
pub mod feast;
pub mod page;
pub mod prompt;
pub mod recipe_generator;
pub mod recipe_ranker;
pub mod server;
pub mod session;
pub mod telemetry;

pub use error::FlowError;
pub use feast::{run_feast, FeastOutcome, FeastRequest, RecipeCard};

pub mod config;
pub mod config_validator;
pub mod document;
pub mod error;
pub mod handlers;
pub mod health;
pub mod id_generator;
pub mod middleware;
pub mod rate_limit;
pub mod response;
pub mod server;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::{ReadexError, Result};
pub use server::create_app;
pub use store::{select_store, DocumentStore, LocalStore, RemoteStore, SharedStore};

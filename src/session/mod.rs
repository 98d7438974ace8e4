pub mod cache;
pub mod config;
pub mod context;
pub mod cookie;
pub mod error;
pub mod identifier;
pub mod manager;
pub mod persistence;
pub mod record;
pub mod scope;


pub use cache::*;
pub use config::*;
pub use context::*;
pub use error::*;
pub use manager::*;
pub use persistence::*;
pub use record::*;
pub use scope::*;

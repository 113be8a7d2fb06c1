pub mod message;
pub mod session;
pub mod journal;
pub mod community;
pub mod user;
pub mod event;
pub mod config;
pub mod error;
mod de;


pub use error::ChesterError;
pub type Result<T> = std::result::Result<T, ChesterError>;

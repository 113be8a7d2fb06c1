pub mod ports;
pub mod query;
pub mod clock;
pub mod identity;
pub mod event_bus;
pub mod session;
pub mod conversation;
pub mod journal;
pub mod stats;
pub mod community;

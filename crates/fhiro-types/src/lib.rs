pub mod api;
pub mod events;
pub mod intake;
pub mod models;
pub mod token;

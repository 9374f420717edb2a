pub mod admin;
pub mod auth;
pub mod contacts;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod waitlist;

//! Admin dashboard logic with no I/O: who may see it, what it shows, and
//! how it exports.

pub mod access;
pub mod aggregate;
pub mod dashboard;
pub mod export;
pub mod filter;

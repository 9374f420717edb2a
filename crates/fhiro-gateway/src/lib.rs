pub mod connection;
pub mod dispatcher;
pub mod live;
pub mod session;

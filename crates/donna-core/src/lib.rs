pub mod config;
pub mod logging;

pub mod reconnect;
pub mod session;

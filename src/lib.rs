pub mod billing;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod session;
#[cfg(test)]
pub mod test_helpers;

// src/lib.rs

pub mod cache;
pub mod config;
pub mod error;
pub mod eventbus;
pub mod models;
pub mod platforms;
pub mod session;
pub mod tasks;
pub mod test_utils;

pub use error::Error;
pub use session::AlertSession;

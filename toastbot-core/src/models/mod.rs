// File: toastbot-core/src/models/mod.rs

pub mod credential;
pub mod profile;

pub use credential::*;
pub use profile::*;

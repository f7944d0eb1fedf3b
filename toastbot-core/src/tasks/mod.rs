// File: toastbot-core/src/tasks/mod.rs

pub mod token_refresh;

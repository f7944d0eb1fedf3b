// File: toastbot-core/src/cache/mod.rs

pub mod dedup;
pub mod profile_cache;

pub use dedup::DedupSet;
pub use profile_cache::ProfileCache;

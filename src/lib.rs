pub mod answers;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod markdown;
pub mod models;
pub mod rotation;
pub mod sync;
pub mod votes;

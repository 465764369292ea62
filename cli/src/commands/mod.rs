pub mod config;
pub mod health;
pub mod link;
pub mod serve;

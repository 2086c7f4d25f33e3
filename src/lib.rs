pub mod app;
pub mod config;
pub mod orchestration;
pub mod policy;
pub mod session;
pub mod shared;
pub mod tasks;

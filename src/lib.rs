pub mod app;
pub mod config;
pub mod error;
pub mod io;
pub mod logger;
pub mod signals;
pub mod solver;
pub mod types;

//! Library crate for portsweep exposing reusable modules.
pub mod output;
pub mod ports;
pub mod scanner;
pub mod services;
pub mod types;

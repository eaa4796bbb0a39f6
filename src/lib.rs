pub mod academy;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod notice;
pub mod payment;
pub mod profile;
pub mod quiz;
pub mod schedule;
pub mod simulator;
pub mod tasks;
pub mod terminal;
pub mod timer;

pub use academy::Academy;
pub use error::AcademyError;

pub mod appointment;
pub mod auth;
pub mod error;
pub mod payment;
pub mod provider;
pub mod session;

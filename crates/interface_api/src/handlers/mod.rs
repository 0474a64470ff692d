//! Request handlers

pub mod auth;
pub mod orders;
pub mod balance;
pub mod health;

//! Core Kernel - Foundational types shared by the loyalty system
//!
//! This crate provides the building blocks used across the workspace:
//! - `Amount`: points with exact two-digit decimal arithmetic
//! - Strongly-typed identifiers
//! - Port error and marker traits for the ports and adapters layout

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Amount, MoneyError};
pub use identifiers::UserId;
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};

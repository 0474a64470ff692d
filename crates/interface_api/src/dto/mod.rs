//! Request and response bodies

pub mod auth;
pub mod orders;
pub mod balance;

pub use auth::{CredentialsRequest, TokenResponse};
pub use orders::OrderResponse;
pub use balance::{BalanceResponse, WithdrawRequest, WithdrawalResponse};

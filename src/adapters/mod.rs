//! Infrastructure adapters. Implement outbound ports.
//!
//! Telegram and the external analysis tool. Map errors to DomainError.

#[cfg(test)]
pub mod mock;
pub mod telegram;
pub mod tools;

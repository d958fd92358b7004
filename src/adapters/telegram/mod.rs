//! Telegram (MTProto via grammers). Implements TgGateway and drives the update loop.

pub mod bot;
pub mod client;
pub mod mapper;
pub mod session;

pub use client::GrammersTgGateway;

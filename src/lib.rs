//! tg-mediainfo: Telegram bot that appends MediaInfo summaries to media captions, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;

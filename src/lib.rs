//! Places Bot Library
//!
//! A Telegram bot that grants each user a trial period and, while their
//! access is valid, shows a ranked list of venues scraped from a listings site.
//!
//! This crate provides the core functionality for:
//! - Tracking per-user access expiry and evicting stale entries
//! - Fetching, parsing and rendering the venue listings
//! - Handling user commands via chat messages

pub mod commands;
pub mod config;
pub mod entitlement;
pub mod listings;
pub mod telegram;

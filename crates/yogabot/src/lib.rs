//! Yogabot - Telegram front end of the yoga club
//!
//! The entitlement protocol lives in `yogacore`; this crate wires it to the
//! Bot API and exposes the HTTP endpoints.

pub mod cli;
pub mod i18n;
pub mod telegram;
pub mod web;

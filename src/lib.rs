//! Background helper that reminds you to clock in and out of a web based time tracker.
//! A daemon watches how long you've been away from your keyboard and nudges you with desktop
//! notifications, or a text message when you've clearly left for the day while still clocked in.
//!

pub mod cli;
pub mod daemon;
pub mod fs;
pub mod idle_api;
pub mod phone;
pub mod settings;
pub mod utils;

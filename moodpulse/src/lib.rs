//! MoodPulse library
//!
//! Background core of the mood tracker: the tick dispatcher, its commands,
//! and the mood and settings services they work against.

pub mod app;
pub mod config;
pub mod database;
pub mod dispatcher;
pub mod error;
pub mod services;

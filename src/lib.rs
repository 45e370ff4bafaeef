//! Productivity Tracker Library
//!
//! This module exports the core components for testing and integration.

pub mod ai;
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod types;

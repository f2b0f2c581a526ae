//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types for 2D draw submission
//! - Collections and data structures
//! - Time management
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;

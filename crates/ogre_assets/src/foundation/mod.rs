//! Foundation module - shared utilities and types
//!
//! This module provides the fundamental utilities used throughout the
//! parsing subsystem:
//! - Math types and operations
//! - Logging utilities

pub mod logging;
pub mod math;

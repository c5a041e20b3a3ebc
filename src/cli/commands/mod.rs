//! Command implementations for wsymbol
//!
//! Each command is implemented in its own module.

pub mod config;
pub mod doctor;
pub mod search;

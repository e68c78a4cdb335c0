//! Configuration module for Loggate.
//!
//! This module contains the defaults applied to incoming query requests.

pub mod defaults;

pub use defaults::QueryDefaults;

//! Command-line front end for the scheme assistant

pub mod commands;
pub mod display;

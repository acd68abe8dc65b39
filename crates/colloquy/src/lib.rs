//! Command-line driver for Colloquy sessions.

pub mod cli;
pub mod commands;
pub mod script;
pub mod sink;

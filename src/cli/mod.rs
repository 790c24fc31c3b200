//! Command implementations behind the `semtag` binary.

pub mod commands;

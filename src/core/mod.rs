//! Core, platform independent bridge code.

pub mod bridge;
pub mod config;
pub mod frame;
pub mod handles;
pub mod link;

#[cfg(test)]
pub mod mock;

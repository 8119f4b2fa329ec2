//! Minimal picture board — upload an image with a title, get a shareable page back.

pub mod cli;
pub mod config;
pub mod http;
pub mod store;

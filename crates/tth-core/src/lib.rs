//! Core tth library (markup transcoder, providers, config).

pub mod config;
pub mod core;
pub mod markup;
pub mod providers;

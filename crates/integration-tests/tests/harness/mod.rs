//! Shared test harness: mock provider backends, config builder, server wrapper

#![allow(dead_code)]

pub mod config;
pub mod mock_llm;
pub mod server;

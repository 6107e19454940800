//! Shared test harness: mock upstream, config builder, test server

#![allow(dead_code)]

pub mod config;
pub mod mock_upstream;
pub mod server;

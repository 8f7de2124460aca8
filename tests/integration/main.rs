//! Integration tests for Screener-Harvest
//!
//! These tests run full searches against wiremock servers serving screener-like pages.

mod common;
mod export_tests;
mod screener_tests;

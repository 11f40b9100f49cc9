//! MCP tool implementations.
//!
//! This module contains all tools exposed by the pageweight server.

pub mod cache;

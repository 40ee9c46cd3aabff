//! MCP server for the ELFA market-intelligence API.
//!
//! Exposes ELFA data-proxy tools (`elfa_*`) and pure technical-analysis tools
//! (`ta_rsi`, `ta_bollinger`, `ta_summary`) over JSON-RPC 2.0 stdio
//! transport, compatible with any MCP-aware AI agent.

pub mod config;
pub mod env;
pub mod handlers;
pub mod protocol;
pub mod proxy;
pub mod schema;
pub mod server;
pub mod ta;
pub mod tools;
pub mod transport;

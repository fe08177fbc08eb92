//! MCP server for compkit
//!
//! Exposes the registry, resolver, materializer and code generators as MCP
//! tools over stdio, so an agent can browse components and copy them into
//! the project it is working on.

pub mod server;
pub mod tools;

pub use server::CompkitServer;

//! One memory for every interface a user talks through.
//!
//! Concord is an [MCP](https://modelcontextprotocol.io/) server that keeps a single
//! conversation log and a small knowledge graph per user, shared across client
//! channels ("interfaces": a terminal session, a messaging channel, ...). Whatever
//! one interface writes, every other interface can read and search.
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `get_unified_context` | summary, messages, and recently updated entities |
//! | `search_unified_memory` | case-insensitive substring search over messages and entities |
//! | `create_unified_entities` | upsert entities, each observation tagged with its interface |
//! | `sync_conversation_state` | union messages into the user's context window |
//! | `add_observations` | append observations to existing entities |
//!
//! # Architecture
//!
//! - **Identity**: callers identify users by any alias (email, phone); an alias table
//!   maps each to one canonical id, which names the user's partition
//! - **Storage**: a [`store::DocumentStore`] port, backed by SQLite in production
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP
//!
//! # Known limitations
//!
//! - Context windows grow without bound; nothing evicts old messages.
//! - With the default `replace` upsert strategy, re-creating an entity discards the
//!   observations recorded for it before, whichever interface wrote them.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization, schema, migrations, and health checks
//! - [`store`]: The document storage port and its SQLite and in-memory backends
//! - [`memory`]: Identity resolution, context window, entity graph, search, facade
//! - [`tools`]: Operation parsing, dispatch, and the MCP tool handler

pub mod config;
pub mod db;
pub mod memory;
pub mod store;
pub mod tools;

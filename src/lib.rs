//! # tp-mcp
//!
//! TrainingPeaks MCP server: credential storage, throttled session
//! validation and the authentication tools.
//!
//! This library provides:
//! - A credential resolver over the `TP_AUTH_COOKIE` variable, the OS keyring
//!   and a machine-bound AES-256-GCM file
//! - A shared request throttle and the session validator built on it
//! - Sanitized `tp_auth_status` / `tp_refresh_auth` tools served over MCP stdio
//!
//! ## Architecture
//!
//! ```text
//!   tp-mcp CLI / MCP server
//!             │
//!             ▼
//!      ┌─────────────┐      ┌──────────────────────┐
//!      │ AuthContext │─────►│  CredentialResolver  │──► env / keyring / file
//!      └──────┬──────┘      └──────────────────────┘
//!             │
//!             ▼
//!   AuthValidator, TpClient ──► Throttle ──► tpapi.trainingpeaks.com
//! ```
//!
//! ## Modules
//! - `auth`: secret types, backends, key derivation and validation
//! - `client`: throttle, error codes and the authenticated API client
//! - `tools`: MCP tool implementations and result sanitizing
//! - `server`: stdio JSON-RPC loop
//! - `cli`: `tp-mcp` subcommands

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod context;
pub mod server;
pub mod tools;
pub mod util;

pub use config::Config;
pub use context::AuthContext;

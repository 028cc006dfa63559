//! # Dataset Query
//!
//! A read-only query service that exposes JSON-backed datasets over HTTP.
//!
//! A client names a dataset with a keyword (`sale`, `sanpham`, `kpi`, ...)
//! or asks a free-text question. The service resolves the input to a
//! category, loads every JSON record stored for it, and narrows the records
//! by substring filters.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌───────────────┐
//! │ keyword /    │──▶│ Catalog / Parser │──▶│ DatasetReader │
//! │ question     │   │  (core crate)    │   │  JSON on disk │
//! └──────────────┘   └──────────────────┘   └───────┬───────┘
//!                                                   ▼
//!                     ┌──────────┐           ┌─────────────┐
//!                     │ CLI/HTTP │◀──────────│   filter    │
//!                     └──────────┘           └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and `DSQ_DATA_ROOT` override |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`error`] | Query error taxonomy |
//! | [`dataset`] | Dataset reader trait and filesystem reader |
//! | [`service`] | Query pipeline shared by CLI and server |
//! | [`server`] | HTTP server |
//! | [`categories`] | Catalog listing for the CLI |
//! | [`commands`] | One-shot CLI queries |

pub mod categories;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod server;
pub mod service;

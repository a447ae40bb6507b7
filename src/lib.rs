//! # saoke-bot
//!
//! A Telegram bot that answers keyword searches over a CSV dataset.
//!
//! The dataset is loaded once at startup. Each incoming message is treated
//! as a query: every row with a field containing the query (ignoring case)
//! is returned, packed into as few replies as the platform's message size
//! allows without ever splitting a row.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │ Webhook  │──▶│  Search  │──▶│  Chunk   │──▶│ Bot API  │
//! │ (axum)   │   │  Table   │   │  rows    │   │ (reqwest)│
//! └──────────┘   └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`table`] | CSV loading into the in-memory table |
//! | [`search`] | Case-insensitive keyword search |
//! | [`chunk`] | Row-preserving reply chunking |
//! | [`telegram`] | Update types, `Messenger` trait, Bot API client |
//! | [`handler`] | Command routing and reply sending |
//! | [`server`] | Webhook HTTP server |
//! | [`webhook`] | Webhook registration |

pub mod chunk;
pub mod config;
pub mod handler;
pub mod search;
pub mod server;
pub mod table;
pub mod telegram;
pub mod webhook;

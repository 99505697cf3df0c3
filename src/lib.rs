//! # Character DB
//!
//! A local catalog of character sheets scraped from an external picture
//! book site. Scraped JSON is imported into SQLite, then searched by name
//! with fixed-size paging and ranked by derived metrics computed from each
//! character's seven base stats.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌──────────┐
//! │ Scraper JSON │──▶│  Import  │──▶│  SQLite  │
//! └──────────────┘   └──────────┘   └────┬─────┘
//!                                        │ paged bulk read
//!                      ┌─────────────────┤
//!                      ▼                 ▼
//!                 ┌──────────┐     ┌──────────────┐
//!                 │   CLI    │     │ HTTP + cache │
//!                 │ (chara)  │     └──────────────┘
//!                 └──────────┘
//!                      search ▸ rank by metric ▸ page
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! chara init
//! chara import ./data/characters.json
//! chara search "えんどう" --sort KP
//! chara serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`metrics`] | Derived metrics and ranking |
//! | [`search`] | Name search and paging |
//! | [`store`] | Record sources (SQLite, in-memory) |
//! | [`cache`] | Read-through range cache |
//! | [`ingest`] | Import of scraped JSON |
//! | [`reading`] | Katakana reading derivation |
//! | [`get`] | Single-record lookup |
//! | [`stats`] | Database summary |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod cache;
pub mod config;
pub mod db;
pub mod get;
pub mod ingest;
pub mod metrics;
pub mod migrate;
pub mod models;
pub mod reading;
pub mod search;
pub mod server;
pub mod stats;
pub mod store;

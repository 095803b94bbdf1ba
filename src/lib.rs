//! Tres en raya: play tic-tac-toe against a search opponent, a friend at the
//! same keyboard, or a remote player through a shared room.
//!
//! # Architecture
//!
//! - **Core** ([`tresenraya_core`]): board model, minimax opponent, local
//!   match controller.
//! - **Online** ([`tresenraya_online`]): document store, room lifecycle,
//!   session synchronizer, chat and move records.
//! - **This crate**: [`AppConfig`] and the terminal front ends in [`play`].
//!
//! # Example
//!
//! ```
//! use tresenraya::AppConfig;
//!
//! let config = AppConfig::from_toml("difficulty = \"hard\"\nsymbol = \"O\"")?;
//! assert_eq!(config.symbol().to_string(), "O");
//! assert_eq!(*config.create_attempts(), 5);
//! # Ok::<(), tresenraya::ConfigError>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
pub mod play;

pub use config::{AppConfig, ConfigError};

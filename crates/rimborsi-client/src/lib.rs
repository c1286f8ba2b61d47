//! Rimborsi Client SDK.
//!
//! This crate provides an async client for the rimborsi HTTP API.
//!
//! # Example
//!
//! ```no_run
//! use rimborsi_client::RimborsiClient;
//!
//! # async fn example() -> Result<(), rimborsi_client::ClientError> {
//! let client = RimborsiClient::new("http://rimborsi:8080", "shared-token")?;
//!
//! let year = "2024".parse().expect("valid year");
//! let download = client.download_all_archives("Anna", year).await?;
//!
//! for chunk in &download.chunks {
//!     println!("entries {}..{} of {}", chunk.from, chunk.to, chunk.total);
//! }
//! if let Some((at, reason)) = &download.stalled {
//!     println!("stopped at {at}: {reason}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, RimborsiClient};
pub use error::ClientError;
pub use types::*;

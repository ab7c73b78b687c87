//! Background polling of record sources.
//!
//! # Examples
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use beacon_core::{
//!     engine::Engine,
//!     runtime::Monitor,
//!     source::{SyntheticConfig, SyntheticSource},
//! };
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Arc::new(Engine::builder().with_seed(7).build()?);
//!     let source = Arc::new(SyntheticSource::new(SyntheticConfig::default()));
//!
//!     let monitor = Arc::new(Monitor::new(engine, source, Duration::from_secs(300)));
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!     let handle = monitor.start_with_shutdown(shutdown_rx, None);
//!
//!     tokio::signal::ctrl_c().await?;
//!     shutdown_tx.send(())?;
//!     handle.await?;
//!     Ok(())
//! }
//! ```

pub mod monitor;

pub use monitor::{Monitor, TickReport};

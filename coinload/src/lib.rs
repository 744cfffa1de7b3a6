//! A fixed-population load generator for the merch-shop API.
//!
//! `coinload` simulates a population of independent virtual users, each
//! driving the same workload against a target service: authenticate once,
//! query `/api/info`, send coins to the next user in the ring, buy an item
//! while the synthetic balance lasts, then idle. Pass/fail checks and request
//! latencies from every user are accumulated into a single [`RunReport`].
//!
//! ```no_run
//! use coinload::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), coinload::Error> {
//!     let report = LoadTest::new("http://localhost:8080")
//!         .users(100)
//!         .duration(Duration::from_secs(30))
//!         .await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod report;
pub mod runner;

mod error;
mod scenario;
mod session;

pub use client::{ApiClient, AuthReply, ShopApi};
pub use config::RunConfig;
pub use error::Error;
pub use report::{Check, CheckSummary, RunReport};
pub use runner::LoadTest;

pub mod prelude {
    pub use crate::report::{Check, RunReport};
    pub use crate::runner::LoadTest;
}

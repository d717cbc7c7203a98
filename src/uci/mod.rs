//! Talking to chess engines over the [Universal Chess Interface] (UCI).
//!
//! [`protocol`] turns commands into text and engine output into structured
//! [`Response`]s, [`Client`] owns the engine process and drives the
//! request/response exchange with timeouts and cancellation.
//!
//! [Universal Chess Interface]: https://www.chessprogramming.org/UCI

mod client;
pub mod protocol;

pub use client::{CancelToken, Client, ClientOptions, EngineId, SearchResult, TimeUnit};
pub use protocol::{Bound, Command, Response, Score, SearchInfo};

#[cfg(test)]
pub(crate) use client::testing;

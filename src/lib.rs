//! httpoll library interface
//!
//! A thin convenience layer over reqwest: every request comes back as a
//! [`CancellableRequest`] that can be aborted through the result itself
//! (at any depth of a combinator chain), plus a self-adjusting long-polling
//! loop with change-detection backoff and external stop/restart/cancel
//! control.
//!
//! # Module Organization
//!
//! - [`client`] - HttpClient, per-verb request operations
//! - [`cancel`] - CancellableRequest wrapper and cancel handles
//! - [`poll`] - Adaptive long-polling loop (PollConfig, PollHandle)
//! - [`errors`] - Error types (HttpollError, Result, is_cancel)
//!
//! # Example
//!
//! ```no_run
//! use httpoll::{HttpClient, PollConfig};
//!
//! # async fn example() -> httpoll::Result<()> {
//! let client = HttpClient::new();
//!
//! // One-shot request, cancellable through the returned future.
//! let request = client.get("http://example.test/status", None);
//! let handle = request.cancel_handle();
//! let response = request.map(|r| r.text()).await?;
//!
//! // Long-poll the same endpoint, backing off while it is unchanged.
//! let poll = client.poll(
//!     "http://example.test/status",
//!     PollConfig::new().run_at_once(true),
//!     |response| println!("{}", response.status()),
//!     |err| eprintln!("{err}"),
//! );
//! poll.cancel(Some("done watching"));
//! # let _ = (handle, response);
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod client;
pub mod errors;
pub mod poll;

pub use cancel::{CancelHandle, CancellableRequest, DEFAULT_CANCEL_MESSAGE};
pub use client::config::{RequestBody, RequestConfig};
pub use client::response::HttpResponse;
pub use client::{HttpClient, HttpClientBuilder};
pub use errors::{is_cancel, HttpollError, Result};
pub use poll::{MapSource, PollConfig, PollHandle};

// Joining combinators for independent requests, forwarded from the
// futures ecosystem.
pub use futures::future::{join_all, try_join_all};

//! 服务队列：跟踪一组网络任务并在全部完成后统一回调。
//!
//! # Service Queue
//!
//! [`ServiceQueue`] ties calls, a [`Session`](crate::transport::Session) and
//! the [`transform`](crate::transform) layer together.
//!
//! ```rust,no_run
//! use rivet::prelude::*;
//! use std::sync::Arc;
//!
//! # #[derive(Debug, Default)] struct Game { uuid: String }
//! # impl Deserializable for Game {
//! #     fn mapping() -> Mapping<Self> {
//! #         Mapping::new().bind("uuid", |m: &mut Game, f| bind_required(&mut m.uuid, f))
//! #     }
//! # }
//! # async fn run() -> rivet::Result<()> {
//! let config = Arc::new(Configuration::new("https://api.example.com/v1")?);
//! let session = Arc::new(HttpSession::new(&config)?);
//! let queue = ServiceQueue::builder(config, session)
//!     .on_final(|failed| println!("done, {} failed", failed.map_or(0, |f| f.len())))
//!     .build();
//!
//! queue.perform_collection(&Call::new("games").with_root_node("results"), true, |result: rivet::Result<Vec<Game>>| {
//!     println!("{:?}", result);
//! });
//! # Ok(())
//! # }
//! ```

mod builder;
mod queue;

pub use builder::ServiceQueueBuilder;
pub use queue::ServiceQueue;

use crate::transport::NetworkTask;
use crate::Error;
use std::collections::HashSet;
use std::sync::Arc;

/// Receives every error a queue reports, before the per-call completion.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Runs once when the last outstanding task of a queue has completed.
pub type FinalCallback = Box<dyn FnOnce(Option<HashSet<NetworkTask>>) + Send + 'static>;

/// Logs the error with `warn!`.
pub fn log_errors() -> ErrorHandler {
    Arc::new(|error: &Error| {
        tracing::warn!(kind = %error.kind(), error = %error, "service error");
    })
}

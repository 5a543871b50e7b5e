//! # rivet
//!
//! 客户端网络与 JSON 对象映射库：任务队列服务层 + 声明式反序列化引擎。
//!
//! Client-side networking and JSON object mapping: a task-queue service layer
//! over an abstract HTTP session, and a declarative engine that maps JSON onto
//! typed models and back.
//!
//! ## Overview
//!
//! - **Service Queue**: [`ServiceQueue`] tracks outstanding network tasks,
//!   routes each completion through validation and decoding, collects
//!   failures and fires one final callback when the last task is done
//! - **Sessions**: [`transport::HttpSession`] runs requests with reqwest;
//!   [`transport::MockSession`] serves canned responses for tests
//! - **Mapping**: models declare a [`deserialize::Mapping`] of field binders;
//!   linked collections are reconciled with server truth rather than replaced
//! - **Mitigation**: a model may repair a structurally broken payload once
//!   before the error surfaces
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rivet::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default)]
//! struct Game {
//!     uuid: String,
//!     price: Option<f64>,
//! }
//!
//! impl Deserializable for Game {
//!     fn mapping() -> Mapping<Self> {
//!         Mapping::new()
//!             .bind("uuid", |m: &mut Game, f| bind_required(&mut m.uuid, f))
//!             .bind("price", |m: &mut Game, f| bind_optional(&mut m.price, f))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> rivet::Result<()> {
//!     let config = Arc::new(Configuration::new("https://api.example.com/v1")?);
//!     let session = Arc::new(HttpSession::new(&config)?);
//!     let queue = ServiceQueue::new(config, session, |failed| {
//!         println!("all done, failed: {:?}", failed.map(|f| f.len()));
//!     });
//!
//!     let call = Call::new("games").with_root_node("results");
//!     queue.perform_collection(&call, true, |games: rivet::Result<Vec<Game>>| {
//!         println!("{:?}", games);
//!     });
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Backend configuration (base URL, timeout, default headers) |
//! | [`request`] | Calls, typed parameters and plain-data HTTP requests |
//! | [`transport`] | Session trait, network tasks, reqwest and mock sessions |
//! | [`deserialize`] | Field binders, entity building, relational reconciliation |
//! | [`serialize`] | Models back to JSON |
//! | [`transform`] | Root-node unwrapping, result shape, mitigation |
//! | [`service`] | The service queue |

pub mod config;
pub mod deserialize;
pub mod error;
pub mod error_kind;
pub mod request;
pub mod serialize;
pub mod service;
pub mod transform;
pub mod transport;

// Re-export main types for convenience
pub use config::{Configuration, ConfigurationBuilder};
pub use error::{Error, ErrorContext};
pub use error_kind::ErrorKind;
pub use request::{Call, HttpMethod, ParameterType, Parameters};
pub use service::{ServiceQueue, ServiceQueueBuilder};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Everything a typical model and call site needs.
pub mod prelude {
    pub use crate::config::Configuration;
    pub use crate::deserialize::{
        bind_date, bind_date_optional, bind_entities_optional, bind_entity, bind_entity_optional,
        bind_entity_or_insert, bind_linked, bind_linked_optional, bind_linked_set, bind_optional,
        bind_raw, bind_raw_optional, bind_required, DateFormat, Deserializable, JsonObject, Link,
        Linkable, Mapping, RawRepresentable, Updatable,
    };
    pub use crate::request::{Call, HttpMethod, Parameters};
    pub use crate::serialize::{
        serialize_date, serialize_entities, serialize_entity, serialize_field, serialize_raw,
        Serializable,
    };
    pub use crate::service::ServiceQueue;
    pub use crate::transport::{HttpSession, MockSession, NetworkTask, Session};
    pub use crate::{Error, Result};
}

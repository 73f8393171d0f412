//! OAuth 2.0 token acquisition engine for confidential clients—client-credentials and
//! on-behalf-of exchanges with per-resource scope resolution and typed provider errors.
//!
//! The crate is the decision core of a token exchange service: an external HTTP
//! collaborator hands it a parsed request plus an [`config::EngineConfig`] and receives
//! back a serializable response payload or a classified [`error::Error`] to render. The
//! engine validates the request, resolves each requested resource to a scope, builds (or
//! fetches) a cached confidential-client handle, executes the matching OAuth grant, and
//! aggregates the per-resource outcomes.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod acquire;
pub mod auth;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod obs;
pub mod provider;
pub mod request;
pub mod resolve;
pub mod response;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod auth;
mod config;
mod error;
mod invite_fn;
mod rows;
mod token;

pub use auth::{AuthClient, TRACING_TARGET_AUTH};
pub use config::{BackendConfig, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use invite_fn::{InviteFunctionClient, TRACING_TARGET_INVITES};
pub use rows::{RowsClient, TRACING_TARGET_ROWS};
pub use token::TokenCell;

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for session lifecycle operations.
pub const TRACING_TARGET_SESSION: &str = "vantage_auth::session";

/// Tracing target for role resolution operations.
pub const TRACING_TARGET_RESOLVER: &str = "vantage_auth::resolver";

mod context;
mod guard;
mod provider;
mod resolver;
mod snapshot;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use context::{AuthContext, AuthContextConfig};
pub use guard::{Denial, EntryRedirect, GuardOutcome, RouteGuard};
pub use provider::{AuthEvent, AuthProvider, AuthSession, InviteSender, RbacStore};
pub use resolver::{ResolvedRoles, resolve_roles};
pub use snapshot::AuthSnapshot;

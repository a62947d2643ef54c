#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Vantage Core
//!
//! This crate defines the RBAC domain model for the vantage dashboard:
//! the closed [`Role`] set, the [`Action`] permission matrix, the entities
//! fetched from the backend collaborators, and the structured [`Error`]
//! used at every crate boundary.

mod action;
mod credentials;
mod error;
mod invite;
mod org;
mod principal;
mod role;
mod task;

pub use action::{Action, MatrixRow, has_permission, permissions_overview};
pub use credentials::{Credentials, SignUpRequest};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use invite::{Invite, NewInvite};
pub use org::{OrgMembership, OrgUser, Organization, sort_memberships};
pub use principal::{Principal, Profile};
pub use role::{Role, effective_role};
pub use task::{NewTask, Task, UpdateTask};

//! Synchronous API client core for the Taiga epics and user stories API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A `Transport` executes the
//! actual round-trip; `Taiga` glues the two together for one-call usage.
//!
//! # Design
//! - `TaigaClient` is stateless: it holds only `base_url` and an optional
//!   bearer token.
//! - Each operation is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit.
//! - Edits are expressed as `EntityPatch` diffs; only changed mutable fields
//!   go on the wire and the server applies them last-write-wins.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod transport;
pub mod types;

pub use client::TaigaClient;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use service::{Epics, Taiga, UserStories};
pub use transport::{Transport, UreqTransport};
pub use types::{
    CreateEpic, CreateRelation, CreateUserStory, Editable, EntityPatch, Epic, EpicId,
    EpicListQuery, EpicPatch, ListQuery, ProjectId, Ref, RelatedUserStory, UserStory,
    UserStoryId, UserStoryListQuery, UserStoryPatch,
};

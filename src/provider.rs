//! Provider-facing configuration (data), registry, and strategies (behavior).
//!
//! `descriptor` exposes validated per-provider client parameters ([`ProviderConfig`])
//! covering HTTPS endpoints, supported grant flags, client authentication preferences,
//! and provider quirks (authorization URL style, offline access, identity token
//! placement). `registry` holds one configuration per [`ProviderKind`] for the lifetime
//! of the process. `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic hook
//! used by flows to augment outgoing token requests and map responses into the gateway
//! error taxonomy.

pub mod descriptor;
pub mod kind;
pub mod registry;
pub mod strategy;

pub use descriptor::*;
pub use kind::*;
pub use registry::*;
pub use strategy::*;

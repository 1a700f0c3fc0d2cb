//! Shared configuration library for lbwatch.
//!
//! Loads the route list (TOML or JSON, from a file or the environment),
//! reports non-fatal configuration warnings, and turns every configured route
//! into a finalized [`lbwatch_core::FileEndpoint`] on one shared
//! [`lbwatch_core::PriorityFilterFactory`]. The `lbwatch` binary is a thin
//! shell over these pieces.
#![allow(missing_docs)]

pub mod bootstrap;
pub mod models;
pub mod util;
pub mod validation;

pub use bootstrap::{
    FailedRoute, ReadyRoute, RouteBootstrap, RouteSummary, bootstrap_routes,
};
pub use models::{
    ConfigFormat, PollDefaults, RouteConfig, WatchConfig, WatchConfigSource,
};
pub use validation::{ConfigWarning, ConfigWarnings, validate};

//! Resolves declarative, brand- and segment-specific screen definitions into personalized UI
//! payloads for remote clients.
//!
//! # Overview
//!
//! A [`ScreenResolver`] takes a validated [`ScreenRequest`] and:
//!
//! 1. looks up the published [`ScreenDefinition`] for the screen, brand and segment, falling back
//!    to the segment-less definition;
//! 2. if an experiment is active and the request carries a user id, replaces the component tree
//!    with the tree of the variant assigned by [`ExperimentAssigner`];
//! 3. fetches every declared data source concurrently through the [`DataProviderRegistry`];
//! 4. interpolates `{{path}}` expressions and expands repeat directives with
//!    [`TemplateResolver`];
//! 5. assembles a [`ResolvedScreen`].
//!
//! Experiment assignment and feature flag evaluation ([`FlagEvaluator`]) are deterministic: the
//! same user always gets the same variant and the same flags, and nothing is persisted.
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum. Only a missing screen or an unreachable store
//! fails a request: a failing data provider is logged and its alias is left out, and a malformed
//! stored tree is treated as empty.
//!
//! # Logging
//!
//! The crate uses the [`log`](https://docs.rs/log/latest/log/) crate with the `screen_resolver`
//! target. Install a `log`-compatible logger to see provider failures and malformed definitions.

#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod config;
mod data_resolver;
mod error;
mod experiment;
mod exposure_logger;
mod flags;
mod model;
mod provider;
mod request;
mod resolver;
mod sharder;
mod store;
mod template;

pub use cache::{screen_cache_key, CacheService};
pub use config::ResolverConfig;
pub use data_resolver::DataResolver;
pub use error::{Error, ProviderError, Result, StoreError, ValidationError};
pub use experiment::{Allocation, Experiment, ExperimentAssigner, Variant};
pub use exposure_logger::{ExposureEvent, ExposureLogger};
pub use flags::{FeatureFlag, FlagEvaluator};
pub use model::{
    Action, Analytics, Brand, Component, ComponentType, Condition, ConditionOperator, DataMap,
    DataSourceDeclaration, Overlay, OverlayStyle, OverlayTrigger, Params, Repeat, ResolvedScreen,
    ScreenDefinition,
};
pub use provider::{DataProvider, DataProviderContext, DataProviderRegistry, HttpDataProvider};
pub use request::{ScreenQuery, ScreenRequest};
pub use resolver::ScreenResolver;
pub use sharder::{Md5Sharder, Sharder, TOTAL_BUCKETS};
pub use store::{
    ExperimentStore, FlagStore, InMemoryExperimentStore, InMemoryFlagStore, InMemoryScreenStore,
    ScreenStore,
};
pub use template::{resolve_path, TemplateResolver};

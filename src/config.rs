use std::{sync::Arc, time::Duration};

use crate::{
    cache::CacheService,
    exposure_logger::NoopExposureLogger,
    model::ResolvedScreen,
    provider::DataProviderRegistry,
    store::{ExperimentStore, ScreenStore},
    ExposureLogger, ScreenResolver,
};

/// Configuration for [`ScreenResolver`].
pub struct ResolverConfig<'a> {
    pub(crate) schema_version: String,
    pub(crate) providers: Option<Arc<DataProviderRegistry>>,
    pub(crate) cache: Option<Arc<CacheService<ResolvedScreen>>>,
    pub(crate) cache_ttl: Option<Duration>,
    pub(crate) exposure_logger: Box<dyn ExposureLogger + Send + Sync + 'a>,
}

impl<'a> Default for ResolverConfig<'a> {
    fn default() -> Self {
        ResolverConfig {
            schema_version: ResolverConfig::DEFAULT_SCHEMA_VERSION.to_owned(),
            providers: None,
            cache: None,
            cache_ttl: None,
            exposure_logger: Box::new(NoopExposureLogger),
        }
    }
}

impl<'a> ResolverConfig<'a> {
    /// Schema version stamped on every payload unless overridden.
    pub const DEFAULT_SCHEMA_VERSION: &'static str = "1.0";

    /// Create a configuration with no data providers, no cache, and a no-op exposure logger.
    ///
    /// ```
    /// # use screen_resolver::ResolverConfig;
    /// ResolverConfig::new();
    /// ```
    pub fn new() -> Self {
        ResolverConfig::default()
    }

    pub fn schema_version(&mut self, schema_version: impl Into<String>) -> &mut Self {
        self.schema_version = schema_version.into();
        self
    }

    /// Set the registry used to resolve declared data sources. Without a registry, templates are
    /// left unresolved.
    pub fn providers(&mut self, providers: Arc<DataProviderRegistry>) -> &mut Self {
        self.providers = Some(providers);
        self
    }

    /// Cache resolved payloads in `cache`. Entries expire after `ttl`, or never if `None`.
    pub fn cache(
        &mut self,
        cache: Arc<CacheService<ResolvedScreen>>,
        ttl: Option<Duration>,
    ) -> &mut Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Set the logger that receives experiment exposures.
    ///
    /// ```
    /// # use screen_resolver::{ExposureEvent, ResolverConfig};
    /// let mut config = ResolverConfig::new();
    /// config.exposure_logger(|event: ExposureEvent| {
    ///     println!("{:?}", event);
    /// });
    /// ```
    pub fn exposure_logger(
        &mut self,
        exposure_logger: impl ExposureLogger + Send + Sync + 'a,
    ) -> &mut Self {
        self.exposure_logger = Box::new(exposure_logger);
        self
    }

    /// Create a new [`ScreenResolver`] reading from the given stores.
    pub fn to_resolver(
        self,
        screens: Arc<dyn ScreenStore + Send + Sync>,
        experiments: Arc<dyn ExperimentStore + Send + Sync>,
    ) -> ScreenResolver<'a> {
        ScreenResolver::new(self, screens, experiments)
    }
}

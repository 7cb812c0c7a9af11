use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;

use crate::{
    cache::screen_cache_key,
    config::ResolverConfig,
    data_resolver::DataResolver,
    experiment::{ExperimentAssigner, Variant},
    model::{Component, Overlay, ResolvedScreen, ScreenDefinition},
    provider::DataProviderContext,
    request::ScreenRequest,
    store::{ExperimentStore, ScreenStore},
    template::TemplateResolver,
    Error, ExposureEvent, Result,
};

/// Turns a [`ScreenRequest`] into the final payload for the client.
///
/// Create one with [`ResolverConfig::to_resolver`] and share it between requests.
pub struct ScreenResolver<'a> {
    screens: Arc<dyn ScreenStore + Send + Sync>,
    experiments: Arc<dyn ExperimentStore + Send + Sync>,
    config: ResolverConfig<'a>,
    assigner: ExperimentAssigner,
    templates: TemplateResolver,
}

/// An experiment variant picked for one request.
struct Assignment {
    experiment_id: String,
    variant: Variant,
}

/// Parse a stored tree, degrading to an empty list when the blob is malformed.
fn parse_tree<T: DeserializeOwned>(raw: &str, screen_id: &str, field: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_else(|err| {
        log::warn!(target: "screen_resolver",
                   screen_id,
                   field;
                   "malformed stored {}, using an empty list: {}", field, err);
        Vec::new()
    })
}

impl<'a> ScreenResolver<'a> {
    pub fn new(
        config: ResolverConfig<'a>,
        screens: Arc<dyn ScreenStore + Send + Sync>,
        experiments: Arc<dyn ExperimentStore + Send + Sync>,
    ) -> Self {
        ScreenResolver {
            screens,
            experiments,
            config,
            assigner: ExperimentAssigner::new(),
            templates: TemplateResolver::new(),
        }
    }

    /// Resolve `request` into a [`ResolvedScreen`].
    ///
    /// Returns [`Error::NotFound`] if no published definition matches, even after falling back to
    /// the segment-less definition, and [`Error::Store`] if a store is unreachable. Failing data
    /// providers and malformed stored trees do not fail the request.
    ///
    /// Experiment assignment runs on every request. Payloads carrying an experiment variant are
    /// never read from or written to the cache.
    pub fn resolve(&self, request: &ScreenRequest) -> Result<ResolvedScreen> {
        let assignment = self.assign_experiment(request)?;

        let cache = match assignment {
            Some(_) => None,
            None => self.config.cache.as_deref(),
        };
        let cache_key = screen_cache_key(
            request.screen_id(),
            request.brand(),
            request.segment(),
            request.user_id(),
        );
        if let Some(screen) = cache.and_then(|cache| cache.get(&cache_key)) {
            log::debug!(target: "screen_resolver", cache_key; "serving resolved screen from cache");
            return Ok(screen);
        }

        let definition = self.find_definition(request)?;
        let screen_id = definition.screen_id.as_str();

        let components = match assignment {
            Some(assignment) => self.apply_variant(request, assignment),
            None => parse_tree::<Component>(&definition.component_tree, screen_id, "componentTree"),
        };

        let components = match &self.config.providers {
            Some(providers) if !definition.data_sources.is_empty() => {
                let context = DataProviderContext {
                    brand: request.brand(),
                    segment: request.segment().map(ToOwned::to_owned),
                    user_id: request.user_id().map(ToOwned::to_owned),
                };
                let data = DataResolver::new(providers)
                    .resolve_data_sources(&definition.data_sources, &context);
                self.templates.resolve_tree(&components, &data)
            }
            _ => components,
        };

        // Overlays are emitted as stored; they are not template-resolved.
        let overlays = definition
            .overlays
            .as_deref()
            .map(|raw| parse_tree::<Overlay>(raw, screen_id, "overlays"))
            .filter(|overlays| !overlays.is_empty());

        let screen = ResolvedScreen {
            schema_version: self.config.schema_version.clone(),
            screen_id: definition.screen_id.clone(),
            brand: definition.brand,
            updated_at: definition.updated_at,
            components,
            overlays,
        };

        log::trace!(target: "screen_resolver",
                    screen_id,
                    brand:display = screen.brand,
                    components = screen.components.len();
                    "resolved screen");

        if let Some(cache) = cache {
            cache.set(cache_key, screen.clone(), self.config.cache_ttl);
        }

        Ok(screen)
    }

    fn find_definition(&self, request: &ScreenRequest) -> Result<ScreenDefinition> {
        let screen_id = request.screen_id();
        let brand = request.brand();

        if let Some(definition) = self
            .screens
            .find_published(screen_id, brand, request.segment())?
        {
            return Ok(definition);
        }

        if let Some(segment) = request.segment() {
            log::debug!(target: "screen_resolver",
                        screen_id,
                        brand:display = brand,
                        segment;
                        "no definition for segment, falling back to default");
            if let Some(definition) = self.screens.find_published(screen_id, brand, None)? {
                return Ok(definition);
            }
        }

        Err(Error::NotFound {
            screen_id: screen_id.to_owned(),
            brand,
            segment: request.segment().map(ToOwned::to_owned),
        })
    }

    /// The variant assigned to the requesting user, if an active experiment covers the screen.
    ///
    /// Anonymous requests are never bucketed.
    fn assign_experiment(&self, request: &ScreenRequest) -> Result<Option<Assignment>> {
        let Some(user_id) = request.user_id() else {
            return Ok(None);
        };
        let Some(experiment) = self
            .experiments
            .find_active(request.screen_id(), request.brand())?
        else {
            return Ok(None);
        };

        let Some(variant_name) = self
            .assigner
            .assign_variant(&experiment.id, user_id, &experiment.variants)
            .map(ToOwned::to_owned)
        else {
            return Ok(None);
        };
        let Some(variant) = experiment
            .variants
            .into_iter()
            .find(|v| v.name == variant_name)
        else {
            log::warn!(target: "screen_resolver",
                       experiment_id:display = experiment.id,
                       variant:display = variant_name;
                       "internal: unable to find assigned variant");
            return Ok(None);
        };

        Ok(Some(Assignment {
            experiment_id: experiment.id,
            variant,
        }))
    }

    /// Log the exposure and return the variant's component tree.
    fn apply_variant(&self, request: &ScreenRequest, assignment: Assignment) -> Vec<Component> {
        let Assignment {
            experiment_id,
            variant,
        } = assignment;
        let user_id = request.user_id().unwrap_or_default();

        log::debug!(target: "screen_resolver",
                    experiment_id:display = experiment_id,
                    variant:display = variant.name,
                    user_id;
                    "applying experiment variant");

        self.config.exposure_logger.log_exposure(ExposureEvent {
            experiment: experiment_id,
            variant: variant.name,
            screen_id: request.screen_id().to_owned(),
            brand: request.brand(),
            subject: user_id.to_owned(),
            timestamp: Utc::now().to_rfc3339(),
        });

        parse_tree(
            &variant.component_tree,
            request.screen_id(),
            "variant componentTree",
        )
    }
}

use std::thread;

use crate::{
    error::ProviderError,
    model::{DataMap, DataSourceDeclaration, Params},
    provider::{DataProviderContext, DataProviderRegistry},
};

/// Why a declared source is missing from the resolved data.
#[derive(thiserror::Error, Debug)]
pub(crate) enum SourceError {
    #[error("provider \"{provider}\" not found for source \"{source_id}\"")]
    UnknownProvider { provider: String, source_id: String },
    #[error("provider \"{provider}\" failed for source \"{source_id}\": {error}")]
    ProviderFailed {
        provider: String,
        source_id: String,
        error: ProviderError,
    },
}

/// Fans out one provider call per declared data source.
pub struct DataResolver<'r> {
    registry: &'r DataProviderRegistry,
}

impl<'r> DataResolver<'r> {
    pub fn new(registry: &'r DataProviderRegistry) -> Self {
        DataResolver { registry }
    }

    /// Resolve all `sources` concurrently and return the values keyed by source id.
    ///
    /// Sources whose provider is unknown or fails are logged and left out of the result; they never
    /// fail their siblings or the caller. All calls are joined before returning, so a slow
    /// provider delays the whole result.
    pub fn resolve_data_sources(
        &self,
        sources: &[DataSourceDeclaration],
        context: &DataProviderContext,
    ) -> DataMap {
        let (data, errors) = self.resolve_partial(sources, context);
        for err in errors {
            let (SourceError::UnknownProvider {
                provider,
                source_id,
            }
            | SourceError::ProviderFailed {
                provider,
                source_id,
                ..
            }) = &err;
            log::warn!(target: "screen_resolver",
                       provider:display = provider,
                       source_id:display = source_id;
                       "{}", err);
        }
        data
    }

    /// Like [`resolve_data_sources`](Self::resolve_data_sources), but hands back the per-source
    /// errors instead of logging them.
    pub(crate) fn resolve_partial(
        &self,
        sources: &[DataSourceDeclaration],
        context: &DataProviderContext,
    ) -> (DataMap, Vec<SourceError>) {
        let empty_params = Params::new();
        let mut errors = Vec::new();

        let results = thread::scope(|scope| {
            let handles = sources
                .iter()
                .filter_map(|source| {
                    let Some(provider) = self.registry.get(&source.provider) else {
                        errors.push(SourceError::UnknownProvider {
                            provider: source.provider.clone(),
                            source_id: source.id.clone(),
                        });
                        return None;
                    };
                    let params = source.params.as_ref().unwrap_or(&empty_params);
                    let handle = thread::Builder::new()
                        .name(format!("provider-{}", source.id))
                        .spawn_scoped(scope, move || provider.resolve(params, context));
                    Some((source, handle))
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .map(|(source, handle)| {
                    let result = match handle {
                        Ok(handle) => handle.join().unwrap_or(Err(ProviderError::Panicked)),
                        Err(err) => Err(ProviderError::Failed(format!(
                            "unable to spawn provider thread: {}",
                            err
                        ))),
                    };
                    (source, result)
                })
                .collect::<Vec<_>>()
        });

        let mut data = DataMap::with_capacity(results.len());
        for (source, result) in results {
            match result {
                Ok(value) => {
                    data.insert(source.id.clone(), value);
                }
                Err(error) => errors.push(SourceError::ProviderFailed {
                    provider: source.provider.clone(),
                    source_id: source.id.clone(),
                    error,
                }),
            }
        }
        (data, errors)
    }
}

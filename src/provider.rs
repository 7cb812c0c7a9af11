use std::{collections::HashMap, sync::Arc, time::Duration};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::{
    error::ProviderError,
    model::{Brand, Params},
};

/// Request-scoped context handed to every provider invocation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataProviderContext {
    pub brand: Brand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// An external data source that screen templates can read from.
///
/// Providers are called concurrently from several threads, hence `Send + Sync`.
pub trait DataProvider: Send + Sync {
    fn resolve(
        &self,
        params: &Params,
        context: &DataProviderContext,
    ) -> Result<serde_json::Value, ProviderError>;
}

impl<T> DataProvider for T
where
    T: Fn(&Params, &DataProviderContext) -> Result<serde_json::Value, ProviderError> + Send + Sync,
{
    fn resolve(
        &self,
        params: &Params,
        context: &DataProviderContext,
    ) -> Result<serde_json::Value, ProviderError> {
        self(params, context)
    }
}

/// Name to provider lookup.
///
/// Populate it once at startup and share it behind an `Arc`; it is never mutated while requests
/// are being served.
#[derive(Default, Clone)]
pub struct DataProviderRegistry {
    providers: HashMap<String, Arc<dyn DataProvider>>,
}

impl DataProviderRegistry {
    pub fn new() -> Self {
        DataProviderRegistry::default()
    }

    /// Register `provider` under `name`, replacing any provider already registered there.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        provider: impl DataProvider + 'static,
    ) -> &mut Self {
        self.providers.insert(name.into(), Arc::new(provider));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn DataProvider>> {
        self.providers.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names = self.providers.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

/// A provider that fetches JSON over HTTP.
///
/// Each invocation issues `GET <base_url>` with the declared params and the request context as
/// query parameters.
pub struct HttpDataProvider {
    // Client holds a connection pool internally, so we're reusing the client between requests.
    client: reqwest::blocking::Client,
    base_url: Url,
}

impl HttpDataProvider {
    /// Default timeout for a single provider request.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        Self::with_timeout(base_url, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let base_url = Url::parse(base_url).map_err(ProviderError::InvalidUrl)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(HttpDataProvider { client, base_url })
    }

    fn request_url(&self, params: &Params, context: &DataProviderContext) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                match value {
                    serde_json::Value::Null => {}
                    serde_json::Value::String(s) => {
                        query.append_pair(key, s);
                    }
                    other => {
                        query.append_pair(key, &other.to_string());
                    }
                }
            }
            query.append_pair("brand", &context.brand.to_string());
            if let Some(segment) = &context.segment {
                query.append_pair("segment", segment);
            }
            if let Some(user_id) = &context.user_id {
                query.append_pair("userId", user_id);
            }
        }
        url
    }
}

impl DataProvider for HttpDataProvider {
    fn resolve(
        &self,
        params: &Params,
        context: &DataProviderContext,
    ) -> Result<serde_json::Value, ProviderError> {
        let url = self.request_url(params, context);

        log::debug!(target: "screen_resolver", url:display = url.path(); "fetching provider data");
        let response = self.client.get(url).send()?.error_for_status()?;

        Ok(response.json()?)
    }
}

use std::{collections::BTreeMap, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    model::Brand,
    sharder::{bucket, Md5Sharder, Sharder},
    store::FlagStore,
    Result,
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlag {
    pub key: String,
    pub brand_a: bool,
    pub brand_b: bool,
    pub brand_c: bool,
    /// Share of identified users that get the flag, in `0..=100`.
    pub rollout_percentage: u8,
}

impl FeatureFlag {
    pub fn is_enabled_for(&self, brand: Brand) -> bool {
        match brand {
            Brand::BrandA => self.brand_a,
            Brand::BrandB => self.brand_b,
            Brand::BrandC => self.brand_c,
        }
    }

    /// Evaluate the flag for a brand-enabled check followed by rollout bucketing.
    pub fn eval(&self, brand: Brand, user_id: Option<&str>, sharder: &impl Sharder) -> bool {
        if !self.is_enabled_for(brand) {
            return false;
        }
        if self.rollout_percentage >= 100 {
            return true;
        }
        // Anonymous callers cannot be bucketed.
        let Some(user_id) = user_id else {
            return false;
        };
        bucket(sharder, user_id, &self.key) < self.rollout_percentage as u64
    }
}

/// Evaluates every stored flag for a brand and (optional) user.
pub struct FlagEvaluator<S: Sharder = Md5Sharder> {
    store: Arc<dyn FlagStore + Send + Sync>,
    sharder: S,
}

impl FlagEvaluator<Md5Sharder> {
    pub fn new(store: Arc<dyn FlagStore + Send + Sync>) -> Self {
        FlagEvaluator {
            store,
            sharder: Md5Sharder,
        }
    }
}

impl<S: Sharder> FlagEvaluator<S> {
    pub fn with_sharder(store: Arc<dyn FlagStore + Send + Sync>, sharder: S) -> Self {
        FlagEvaluator { store, sharder }
    }

    /// Compute a value for every flag in the store.
    ///
    /// An unrecognized `brand` disables every flag. Only an unreachable flag store is an error.
    pub fn evaluate_flags(
        &self,
        brand: &str,
        user_id: Option<&str>,
    ) -> Result<BTreeMap<String, bool>> {
        let flags = self.store.list_all()?;
        let brand = Brand::from_str(brand).ok();

        let evaluated = flags
            .iter()
            .map(|flag| {
                let value = brand.is_some_and(|brand| flag.eval(brand, user_id, &self.sharder));
                (flag.key.clone(), value)
            })
            .collect::<BTreeMap<_, _>>();

        log::trace!(target: "screen_resolver",
                    user_id,
                    flags:serde = evaluated;
                    "evaluated flags");

        Ok(evaluated)
    }
}

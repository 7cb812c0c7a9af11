use serde::{Deserialize, Serialize};

use crate::{
    model::Brand,
    sharder::{bucket, Md5Sharder, Sharder},
};

/// An A/B experiment running on a screen.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub id: String,
    pub screen_id: String,
    pub brand: Brand,
    pub active: bool,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub name: String,
    /// Share of traffic in `0..=100`.
    pub percentage: u8,
    /// Serialized component tree that replaces the base screen tree.
    pub component_tree: String,
}

/// Anything that can take part in allocation: a name and a traffic share.
pub trait Allocation {
    fn name(&self) -> &str;
    fn percentage(&self) -> u8;
}

impl Allocation for Variant {
    fn name(&self) -> &str {
        &self.name
    }
    fn percentage(&self) -> u8 {
        self.percentage
    }
}

impl<S: AsRef<str>> Allocation for (S, u8) {
    fn name(&self) -> &str {
        self.0.as_ref()
    }
    fn percentage(&self) -> u8 {
        self.1
    }
}

/// Stateless variant selection. The same `(user, experiment)` pair always lands on the same
/// variant.
pub struct ExperimentAssigner<S: Sharder = Md5Sharder> {
    sharder: S,
}

impl ExperimentAssigner<Md5Sharder> {
    pub fn new() -> Self {
        ExperimentAssigner {
            sharder: Md5Sharder,
        }
    }
}

impl Default for ExperimentAssigner<Md5Sharder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sharder> ExperimentAssigner<S> {
    pub fn with_sharder(sharder: S) -> Self {
        ExperimentAssigner { sharder }
    }

    /// Pick the variant for `user_id`, or `None` if there are no variants.
    ///
    /// Variants are walked in order accumulating their percentage; the first one whose cumulative
    /// share exceeds the user's bucket wins. If the shares sum to less than 100, the last variant
    /// takes the remainder.
    pub fn assign_variant<'v, A: Allocation>(
        &self,
        experiment_id: &str,
        user_id: &str,
        variants: &'v [A],
    ) -> Option<&'v str> {
        let last = variants.last()?;
        let bucket = bucket(&self.sharder, user_id, experiment_id);

        let mut cumulative = 0u64;
        let chosen = variants
            .iter()
            .find(|variant| {
                cumulative += variant.percentage() as u64;
                cumulative > bucket
            })
            .unwrap_or(last);

        Some(chosen.name())
    }
}

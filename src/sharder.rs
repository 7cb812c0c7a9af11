pub trait Sharder {
    fn get_shard(&self, input: &str, total_shards: u64) -> u64;
}

/// Number of buckets used for experiment allocation and flag rollout.
pub const TOTAL_BUCKETS: u64 = 100;

pub struct Md5Sharder;

impl Sharder for Md5Sharder {
    fn get_shard(&self, input: &str, total_shards: u64) -> u64 {
        let hash = md5::compute(input);
        let value = u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]]);
        (value as u64) % total_shards
    }
}

/// Bucket of `subject` within `namespace` (an experiment id or a flag key).
pub(crate) fn bucket(sharder: &impl Sharder, subject: &str, namespace: &str) -> u64 {
    sharder.get_shard(&format!("{}:{}", subject, namespace), TOTAL_BUCKETS)
}

#[cfg(test)]
pub struct DeterministicSharder(pub std::collections::HashMap<String, u64>);

#[cfg(test)]
impl Sharder for DeterministicSharder {
    fn get_shard(&self, input: &str, total_shards: u64) -> u64 {
        self.0.get(input).copied().unwrap_or(0) % total_shards
    }
}

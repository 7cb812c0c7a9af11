use serde::{Deserialize, Serialize};

use crate::model::Brand;

/// Records that a user was shown an experiment variant.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExposureEvent {
    pub experiment: String,
    pub variant: String,
    pub screen_id: String,
    pub brand: Brand,
    pub subject: String,
    pub timestamp: String,
}

/// Receives exposure events to forward to an analytics pipeline.
///
/// Delivery is best-effort: the resolver calls the logger once per resolution and never retries.
pub trait ExposureLogger {
    fn log_exposure(&self, event: ExposureEvent);
}

pub(crate) struct NoopExposureLogger;
impl ExposureLogger for NoopExposureLogger {
    fn log_exposure(&self, _event: ExposureEvent) {}
}

impl<T: Fn(ExposureEvent)> ExposureLogger for T {
    fn log_exposure(&self, event: ExposureEvent) {
        self(event);
    }
}

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{error::ValidationError, model::Brand};

const MAX_USER_ID_LEN: usize = 128;

/// Raw request parameters, as they arrive from a query string.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScreenQuery {
    pub screen_id: String,
    pub brand: String,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A validated screen request. Can only be built through [`ScreenQuery::validate`] or
/// [`ScreenRequest::new`], so resolution never sees unchecked identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenRequest {
    screen_id: String,
    brand: Brand,
    segment: Option<String>,
    user_id: Option<String>,
}

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").expect("identifier pattern is valid")
    })
}

impl ScreenQuery {
    /// Check every parameter, rejecting the request before any store is queried.
    ///
    /// Empty `segment` and `userId` are treated as absent.
    pub fn validate(self) -> Result<ScreenRequest, ValidationError> {
        if !identifier_pattern().is_match(&self.screen_id) {
            return Err(ValidationError::InvalidScreenId(self.screen_id));
        }

        let brand = self
            .brand
            .parse::<Brand>()
            .map_err(|()| ValidationError::UnknownBrand(self.brand.clone()))?;

        let segment = match self.segment.filter(|s| !s.is_empty()) {
            Some(segment) if !identifier_pattern().is_match(&segment) => {
                return Err(ValidationError::InvalidSegment(segment));
            }
            segment => segment,
        };

        let user_id = self.user_id.filter(|s| !s.is_empty());
        if let Some(user_id) = &user_id {
            if user_id.chars().count() > MAX_USER_ID_LEN || user_id.chars().any(char::is_control) {
                return Err(ValidationError::InvalidUserId);
            }
        }

        Ok(ScreenRequest {
            screen_id: self.screen_id,
            brand,
            segment,
            user_id,
        })
    }
}

impl ScreenRequest {
    /// Build a request from already-trusted values.
    pub fn new(screen_id: impl Into<String>, brand: Brand) -> Self {
        ScreenRequest {
            screen_id: screen_id.into(),
            brand,
            segment: None,
            user_id: None,
        }
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn screen_id(&self) -> &str {
        &self.screen_id
    }

    pub fn brand(&self) -> Brand {
        self.brand
    }

    pub fn segment(&self) -> Option<&str> {
        self.segment.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

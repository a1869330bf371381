use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::http::{RpcError, ValidatedUrl};
use crate::{DEFAULT_ENDPOINT_HOST, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SEARCH_DEBOUNCE};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] RpcError),

    #[error("page size must be between 1 and {max}, got {size}")]
    PageSize { size: u32, max: u32 },
}

/// What the shell hands over on start. Absent values keep the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupSettings {
    pub base_url: String,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub search_debounce_ms: Option<u64>,
}

impl StartupSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: None,
            search_debounce_ms: None,
        }
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn search_debounce_ms(mut self, millis: u64) -> Self {
        self.search_debounce_ms = Some(millis);
        self
    }
}

/// Everything the core needs from the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasesConfig {
    endpoint: ValidatedUrl,
    page_size: u32,
    search_debounce: Duration,
}

impl Default for CasesConfig {
    fn default() -> Self {
        Self {
            endpoint: ValidatedUrl::from_parts("https", DEFAULT_ENDPOINT_HOST),
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: SEARCH_DEBOUNCE,
        }
    }
}

impl CasesConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        Self::default().with_endpoint(base_url)
    }

    pub fn from_settings(settings: &StartupSettings) -> Result<Self, ConfigError> {
        let mut config = Self::new(settings.base_url.as_str())?;
        if let Some(page_size) = settings.page_size {
            config = config.with_page_size(page_size)?;
        }
        if let Some(millis) = settings.search_debounce_ms {
            config = config.with_search_debounce(Duration::from_millis(millis));
        }
        Ok(config)
    }

    pub fn with_endpoint(mut self, base_url: impl Into<String>) -> Result<Self, ConfigError> {
        self.endpoint = ValidatedUrl::new(base_url)?;
        Ok(self)
    }

    pub fn with_page_size(mut self, page_size: u32) -> Result<Self, ConfigError> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::PageSize {
                size: page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        self.page_size = page_size;
        Ok(self)
    }

    #[must_use]
    pub fn with_search_debounce(mut self, delay: Duration) -> Self {
        self.search_debounce = delay;
        self
    }

    pub fn endpoint(&self) -> &ValidatedUrl {
        &self.endpoint
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn search_debounce(&self) -> Duration {
        self.search_debounce
    }
}

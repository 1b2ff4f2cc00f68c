//! Settings Models
//!
//! Configuration for the in-band markers the streaming layer recognizes.
//! Loaded from TOML by the host application; every field has a default so an
//! absent or partial file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use assistant_stream_core::{CoreError, CoreResult};

use crate::services::extraction::{
    extract_code_from_fim, ExtractedCode, Progress, ReasoningTags, SearchReplaceExtractor,
    SearchReplaceMarkers,
};
use crate::services::streaming::AdapterFactory;

/// Marker configuration for one streaming layer instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Reasoning tag pair; when unset the provider/model default applies
    pub reasoning_tags: Option<ReasoningTags>,
    /// Search/replace block markers
    pub search_replace: SearchReplaceMarkers,
    /// Name of the fill-in-the-middle tag (`MID` means `<MID>` / `</MID>`)
    pub fim_mid_tag: String,
}

fn default_fim_mid_tag() -> String {
    "MID".to_string()
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            reasoning_tags: None,
            search_replace: SearchReplaceMarkers::default(),
            fim_mid_tag: default_fim_mid_tag(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub reasoning_tags: Option<ReasoningTags>,
    pub search_replace: Option<SearchReplaceMarkers>,
    pub fim_mid_tag: Option<String>,
}

impl StreamingConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| CoreError::parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no streaming config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject markers that would match everywhere.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(tags) = &self.reasoning_tags {
            if tags.open.is_empty() || tags.close.is_empty() {
                return Err(CoreError::config("reasoning tags must not be empty"));
            }
        }
        let markers = &self.search_replace;
        if markers.original.is_empty() || markers.divider.is_empty() || markers.final_marker.is_empty() {
            return Err(CoreError::config("search/replace markers must not be empty"));
        }
        if self.fim_mid_tag.is_empty() {
            return Err(CoreError::config("fim_mid_tag must not be empty"));
        }
        Ok(())
    }

    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(tags) = update.reasoning_tags {
            self.reasoning_tags = Some(tags);
        }
        if let Some(markers) = update.search_replace {
            self.search_replace = markers;
        }
        if let Some(tag) = update.fim_mid_tag {
            self.fim_mid_tag = tag;
        }
    }

    /// Reasoning tags to apply for a provider/model pair.
    pub fn reasoning_tags_for(&self, provider: &str, model: &str) -> Option<ReasoningTags> {
        self.reasoning_tags
            .clone()
            .or_else(|| AdapterFactory::default_reasoning_tags(provider, model))
    }

    /// Search/replace extractor over the configured markers.
    pub fn search_replace_extractor(&self) -> SearchReplaceExtractor {
        SearchReplaceExtractor::new(self.search_replace.clone())
    }

    /// FIM extraction using the configured mid tag.
    pub fn extract_fim(&self, text: &str, recently_added_len: usize) -> Progress<ExtractedCode> {
        extract_code_from_fim(text, recently_added_len, &self.fim_mid_tag)
    }
}

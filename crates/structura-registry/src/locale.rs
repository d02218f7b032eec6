//! Locale fallback for ghost content
//!
//! When a document is requested in a locale its node has no content for,
//! the document is loaded in the closest available locale instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Document;
use crate::encoding;
use crate::hydrate::HydrateOptions;
use crate::node::Node;

/// Finds a substitute locale within a webspace
pub trait LocalizationFinder: Send + Sync {
    fn find_available_locale(
        &self,
        webspace: &str,
        available: &[String],
        requested: &str,
    ) -> Option<String>;
}

/// Finder for setups without webspace localizations
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocalizationFinder;

impl LocalizationFinder for NoLocalizationFinder {
    fn find_available_locale(&self, _: &str, _: &[String], _: &str) -> Option<String> {
        None
    }
}

/// Fallback chains configured per webspace
///
/// ```json
/// { "sulu_io": { "de_at": ["de", "en"] } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebspaceLocalizationFinder {
    webspaces: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl WebspaceLocalizationFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fallback chain for a locale of a webspace
    pub fn with_fallbacks<I, S>(mut self, webspace: &str, locale: &str, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.webspaces
            .entry(webspace.to_string())
            .or_default()
            .insert(locale.to_string(), fallbacks.into_iter().map(Into::into).collect());
        self
    }

    pub fn fallbacks(&self, webspace: &str, locale: &str) -> &[String] {
        self.webspaces
            .get(webspace)
            .and_then(|locales| locales.get(locale))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl LocalizationFinder for WebspaceLocalizationFinder {
    fn find_available_locale(
        &self,
        webspace: &str,
        available: &[String],
        requested: &str,
    ) -> Option<String> {
        self.fallbacks(webspace, requested)
            .iter()
            .find(|fallback| available.contains(fallback))
            .cloned()
    }
}

/// Chooses the locale a document is actually loaded in
pub struct LocaleFallbackResolver {
    finder: Box<dyn LocalizationFinder>,
}

impl LocaleFallbackResolver {
    pub fn new(finder: impl LocalizationFinder + 'static) -> Self {
        Self {
            finder: Box::new(finder),
        }
    }

    /// Resolve the locale to load `document` in from `node`
    ///
    /// Returns the requested locale unchanged for documents without localized
    /// structure, for an absent or empty request and when ghost content is
    /// disabled.
    pub fn resolve_locale(
        &self,
        document: &Document,
        node: &Node,
        requested: Option<&str>,
        options: &HydrateOptions,
        default_locale: &str,
    ) -> Option<String> {
        let requested = match requested {
            Some(locale) if !locale.is_empty() => locale,
            other => return other.map(str::to_string),
        };

        if !document.supports_localized_structure() || !options.load_ghost_content {
            return Some(requested.to_string());
        }

        let available = encoding::locales(node);
        if available.iter().any(|locale| locale == requested) {
            return Some(requested.to_string());
        }

        let fallback = document
            .webspace()
            .and_then(|webspace| self.finder.find_available_locale(webspace, &available, requested))
            .filter(|locale| !locale.is_empty())
            .or_else(|| available.first().cloned())
            .unwrap_or_else(|| default_locale.to_string());

        debug!(
            "Locale {} not available for node {}, falling back to {}",
            requested, node.uuid, fallback
        );

        Some(fallback)
    }
}

impl Default for LocaleFallbackResolver {
    fn default() -> Self {
        Self::new(NoLocalizationFinder)
    }
}

impl std::fmt::Debug for LocaleFallbackResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleFallbackResolver").finish_non_exhaustive()
    }
}

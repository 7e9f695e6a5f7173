//! Operation contexts: what to fetch and whether to use the cache.

use super::object::PropertyIds;
use crate::config::SessionParameterDefaults;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Which relationships to include with an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IncludeRelationships {
    #[default]
    None,
    Source,
    Target,
    Both,
}

impl IncludeRelationships {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncludeRelationships::None => "none",
            IncludeRelationships::Source => "source",
            IncludeRelationships::Target => "target",
            IncludeRelationships::Both => "both",
        }
    }
}

/// Direction filter for relationship listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipDirection {
    #[default]
    Source,
    Target,
    Either,
}

/// Rendition filter sent when none was requested.
const NO_RENDITIONS: &str = "cmis:none";

/// Settings for one read operation.
///
/// Two contexts that would fetch the same variant of an object produce the
/// same [`cache_key`](Self::cache_key); `cache_enabled`, `order_by` and the
/// page size do not take part in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OperationContext {
    filter: BTreeSet<String>,
    include_acls: bool,
    include_allowable_actions: bool,
    include_policies: bool,
    include_relationships: IncludeRelationships,
    rendition_filter: BTreeSet<String>,
    include_path_segments: bool,
    order_by: Option<String>,
    cache_enabled: bool,
    max_items_per_page: u64,
}

impl Default for OperationContext {
    fn default() -> Self {
        Self {
            filter: BTreeSet::new(),
            include_acls: false,
            include_allowable_actions: true,
            include_policies: false,
            include_relationships: IncludeRelationships::None,
            rendition_filter: BTreeSet::new(),
            include_path_segments: true,
            order_by: None,
            cache_enabled: true,
            max_items_per_page: SessionParameterDefaults::MAX_ITEMS_PER_PAGE,
        }
    }
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned properties. Empty means all.
    pub fn with_filter<I, S>(mut self, filter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = filter
            .into_iter()
            .map(Into::into)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    pub fn with_include_acls(mut self, include: bool) -> Self {
        self.include_acls = include;
        self
    }

    pub fn with_include_allowable_actions(mut self, include: bool) -> Self {
        self.include_allowable_actions = include;
        self
    }

    pub fn with_include_policies(mut self, include: bool) -> Self {
        self.include_policies = include;
        self
    }

    pub fn with_include_relationships(mut self, include: IncludeRelationships) -> Self {
        self.include_relationships = include;
        self
    }

    pub fn with_rendition_filter<I, S>(mut self, filter: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rendition_filter = filter.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_include_path_segments(mut self, include: bool) -> Self {
        self.include_path_segments = include;
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Page size for listings. Zero is raised to one.
    pub fn with_max_items_per_page(mut self, max: u64) -> Self {
        self.max_items_per_page = max.max(1);
        self
    }

    pub fn include_acls(&self) -> bool {
        self.include_acls
    }

    pub fn include_allowable_actions(&self) -> bool {
        self.include_allowable_actions
    }

    pub fn include_policies(&self) -> bool {
        self.include_policies
    }

    pub fn include_relationships(&self) -> IncludeRelationships {
        self.include_relationships
    }

    pub fn include_path_segments(&self) -> bool {
        self.include_path_segments
    }

    pub fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    pub fn is_cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn max_items_per_page(&self) -> u64 {
        self.max_items_per_page
    }

    /// Property filter in wire form, or `None` for all properties.
    ///
    /// The id and type properties are always requested so results can be
    /// turned back into objects.
    pub fn query_filter_string(&self) -> Option<String> {
        if self.filter.is_empty() {
            return None;
        }
        if self.filter.contains("*") {
            return Some("*".to_string());
        }

        let mut filter = self.filter.clone();
        filter.insert(PropertyIds::OBJECT_ID.to_string());
        filter.insert(PropertyIds::BASE_TYPE_ID.to_string());
        filter.insert(PropertyIds::OBJECT_TYPE_ID.to_string());
        Some(filter.into_iter().collect::<Vec<_>>().join(","))
    }

    /// Rendition filter in wire form.
    pub fn rendition_filter_string(&self) -> String {
        if self.rendition_filter.is_empty() {
            NO_RENDITIONS.to_string()
        } else {
            self.rendition_filter
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(",")
        }
    }

    /// Stable key naming the object variant this context fetches.
    pub fn cache_key(&self) -> String {
        let canonical = format!(
            "{}{}{}|{}|{}|{}",
            u8::from(self.include_acls),
            u8::from(self.include_allowable_actions),
            u8::from(self.include_policies),
            self.include_relationships.as_str(),
            self.query_filter_string().unwrap_or_default(),
            self.rendition_filter_string(),
        );
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }
}

//! Repository and type-definition records.

use super::object::BaseTypeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// CMIS protocol version a repository implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CmisVersion {
    #[serde(rename = "1.0")]
    Cmis10,
    #[serde(rename = "1.1")]
    #[default]
    Cmis11,
}

/// Descriptor of one repository behind an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RepositoryInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_version: Option<String>,
    pub root_folder_id: String,
    #[serde(default)]
    pub cmis_version: CmisVersion,
    #[serde(default)]
    pub latest_change_log_token: Option<String>,
}

impl RepositoryInfo {
    pub fn new(id: impl Into<String>, root_folder_id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: None,
            vendor_name: None,
            product_name: None,
            product_version: None,
            root_folder_id: root_folder_id.into(),
            cmis_version: CmisVersion::default(),
            latest_change_log_token: None,
        }
    }
}

/// Definition of an object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TypeDefinition {
    pub id: String,
    #[serde(default)]
    pub local_name: String,
    pub query_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub base_type_id: BaseTypeId,
    #[serde(default)]
    pub parent_type_id: Option<String>,
    /// Only meaningful for document types.
    #[serde(default)]
    pub versionable: Option<bool>,
    /// Property definitions keyed by property id; opaque here.
    #[serde(default)]
    pub property_definitions: BTreeMap<String, Value>,
}

impl TypeDefinition {
    pub fn new(id: impl Into<String>, base_type_id: BaseTypeId) -> Self {
        let id = id.into();
        Self {
            local_name: id.clone(),
            query_name: id.clone(),
            display_name: id.clone(),
            id,
            description: None,
            base_type_id,
            parent_type_id: None,
            versionable: None,
            property_definitions: BTreeMap::new(),
        }
    }

    pub fn is_versionable(&self) -> bool {
        self.versionable.unwrap_or(false)
    }
}

/// One page of type definitions from a type-children call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinitionList {
    pub list: Vec<TypeDefinition>,
    #[serde(default)]
    pub num_items: Option<u64>,
    #[serde(default)]
    pub has_more_items: bool,
}

/// Node of a type hierarchy returned by a type-descendants call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinitionContainer {
    pub type_definition: TypeDefinition,
    #[serde(default)]
    pub children: Vec<TypeDefinitionContainer>,
}

impl TypeDefinitionContainer {
    /// Visit this node and all of its descendants, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TypeDefinition)) {
        visit(&self.type_definition);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

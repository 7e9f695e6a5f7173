//! Raw records exchanged with the binding layer, before conversion into
//! domain objects.

use super::object::{Properties, PropertyIds};
use super::results::ChangeType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Change-log information attached to an object entry of a change listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEventInfo {
    pub change_type: ChangeType,
    #[serde(default)]
    pub change_time: Option<DateTime<Utc>>,
}

/// Object as delivered by the binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub allowable_actions: Vec<String>,
    #[serde(default)]
    pub change_event_info: Option<ChangeEventInfo>,
}

impl ObjectData {
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.properties
            .get(PropertyIds::OBJECT_ID)
            .and_then(|value| value.as_str())
    }
}

/// One page of objects from a listing call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectList {
    pub objects: Vec<ObjectData>,
    /// Total across all pages, when the server reports it.
    #[serde(default)]
    pub num_items: Option<u64>,
    #[serde(default)]
    pub has_more_items: bool,
}

/// A child entry of a folder listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInFolderData {
    pub object: ObjectData,
    #[serde(default)]
    pub path_segment: Option<String>,
}

/// One page of a folder's children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectInFolderList {
    pub objects: Vec<ObjectInFolderData>,
    #[serde(default)]
    pub num_items: Option<u64>,
    #[serde(default)]
    pub has_more_items: bool,
}

/// Node of a descendants or folder-tree listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInFolderContainer {
    pub object: ObjectInFolderData,
    #[serde(default)]
    pub children: Vec<ObjectInFolderContainer>,
}

/// Generic tree node used for converted descendants.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree<T> {
    pub item: T,
    pub children: Vec<Tree<T>>,
}

/// Document content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentStream {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub stream: Vec<u8>,
}

/// Ids a tree deletion could not remove.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailedToDelete {
    pub ids: Vec<String>,
}

/// A page of content changes together with the token to continue from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentChanges {
    pub list: ObjectList,
    pub next_change_log_token: Option<String>,
}

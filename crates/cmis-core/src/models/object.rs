//! CMIS domain objects as seen by the cache.

use crate::session::{Session, SessionLink};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Property values keyed by property id. Values are opaque to this crate.
pub type Properties = BTreeMap<String, Value>;

/// Well-known CMIS property ids.
pub struct PropertyIds;

impl PropertyIds {
    pub const OBJECT_ID: &'static str = "cmis:objectId";
    pub const BASE_TYPE_ID: &'static str = "cmis:baseTypeId";
    pub const OBJECT_TYPE_ID: &'static str = "cmis:objectTypeId";
    pub const NAME: &'static str = "cmis:name";
    pub const PATH: &'static str = "cmis:path";
    pub const PARENT_ID: &'static str = "cmis:parentId";
    pub const VERSION_SERIES_ID: &'static str = "cmis:versionSeriesId";
    pub const SOURCE_ID: &'static str = "cmis:sourceId";
    pub const TARGET_ID: &'static str = "cmis:targetId";
    pub const CHANGE_TOKEN: &'static str = "cmis:changeToken";
}

/// CMIS base object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseTypeId {
    #[serde(rename = "cmis:document")]
    Document,
    #[serde(rename = "cmis:folder")]
    Folder,
    #[serde(rename = "cmis:relationship")]
    Relationship,
    #[serde(rename = "cmis:policy")]
    Policy,
    #[serde(rename = "cmis:item")]
    Item,
    #[serde(rename = "cmis:secondary")]
    Secondary,
}

impl BaseTypeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseTypeId::Document => "cmis:document",
            BaseTypeId::Folder => "cmis:folder",
            BaseTypeId::Relationship => "cmis:relationship",
            BaseTypeId::Policy => "cmis:policy",
            BaseTypeId::Item => "cmis:item",
            BaseTypeId::Secondary => "cmis:secondary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cmis:document" => Some(BaseTypeId::Document),
            "cmis:folder" => Some(BaseTypeId::Folder),
            "cmis:relationship" => Some(BaseTypeId::Relationship),
            "cmis:policy" => Some(BaseTypeId::Policy),
            "cmis:item" => Some(BaseTypeId::Item),
            "cmis:secondary" => Some(BaseTypeId::Secondary),
            _ => None,
        }
    }
}

impl fmt::Display for BaseTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document, folder, relationship, policy or item.
///
/// The owning session is not part of the serialized form. Objects read back
/// from a cache are reattached to the reading session before being handed
/// out, so a cached snapshot never pins the session that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmisObject {
    id: String,
    base_type_id: BaseTypeId,
    object_type_id: String,
    #[serde(default)]
    properties: Properties,
    #[serde(skip)]
    session: Option<SessionLink>,
}

impl CmisObject {
    pub fn new(
        id: impl Into<String>,
        base_type_id: BaseTypeId,
        object_type_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            base_type_id,
            object_type_id: object_type_id.into(),
            properties: Properties::new(),
            session: None,
        }
    }

    /// Shorthand for a `cmis:document` object.
    pub fn document(id: impl Into<String>) -> Self {
        Self::new(id, BaseTypeId::Document, BaseTypeId::Document.as_str())
    }

    /// Shorthand for a `cmis:folder` object located at `path`.
    pub fn folder(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(id, BaseTypeId::Folder, BaseTypeId::Folder.as_str())
            .with_property(PropertyIds::PATH, Value::String(path.into()))
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, id: impl Into<String>, value: Value) -> Self {
        self.properties.insert(id.into(), value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn base_type_id(&self) -> BaseTypeId {
        self.base_type_id
    }

    pub fn object_type_id(&self) -> &str {
        &self.object_type_id
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, id: &str) -> Option<&Value> {
        self.properties.get(id)
    }

    /// First value of a string property; multi-valued properties are
    /// transported as arrays.
    pub fn string_property(&self, id: &str) -> Option<&str> {
        match self.properties.get(id)? {
            Value::String(s) => Some(s.as_str()),
            Value::Array(values) => values.first().and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.string_property(PropertyIds::NAME)
    }

    /// Hierarchical path. Only folders report one.
    pub fn path(&self) -> Option<&str> {
        self.string_property(PropertyIds::PATH)
            .filter(|path| !path.is_empty())
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.string_property(PropertyIds::PARENT_ID)
    }

    pub fn version_series_id(&self) -> Option<&str> {
        self.string_property(PropertyIds::VERSION_SERIES_ID)
    }

    pub fn is_document(&self) -> bool {
        self.base_type_id == BaseTypeId::Document
    }

    pub fn is_folder(&self) -> bool {
        self.base_type_id == BaseTypeId::Folder
    }

    pub fn is_relationship(&self) -> bool {
        self.base_type_id == BaseTypeId::Relationship
    }

    /// Link to the session this object currently belongs to.
    pub fn session_link(&self) -> Option<&SessionLink> {
        self.session.as_ref()
    }

    /// Id of the owning session, if attached.
    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(SessionLink::session_id)
    }

    /// The owning session, if attached and still alive.
    pub fn session(&self) -> Option<Session> {
        self.session.as_ref().and_then(SessionLink::upgrade)
    }

    /// Rebind this object to `link`.
    pub fn refresh_session(&mut self, link: &SessionLink) {
        self.session = Some(link.clone());
    }
}

/// Equality ignores the session back-reference: two snapshots with the same
/// content are the same object state regardless of who reads them.
impl PartialEq for CmisObject {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.base_type_id == other.base_type_id
            && self.object_type_id == other.object_type_id
            && self.properties == other.properties
    }
}

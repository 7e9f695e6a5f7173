//! Scripted in-memory repository used by the integration tests.
//!
//! Implements every remote service over a few maps and logs each call, so
//! tests can assert how often the remote side was reached.

#![allow(dead_code)]

use cmis_client::binding::{
    DiscoveryService, NavigationService, ObjectService, RelationshipService, RepositoryService,
    VersioningService,
};
use cmis_client::models::{
    BaseTypeId, ChangeEventInfo, ChangeType, CmisVersion, ContentChanges, ContentStream,
    FailedToDelete, ObjectData, ObjectInFolderContainer, ObjectInFolderData, ObjectInFolderList,
    ObjectList, OperationContext, Properties, PropertyIds, RelationshipDirection,
    RepositoryInfo, TypeDefinition, TypeDefinitionContainer, TypeDefinitionList,
};
use cmis_client::{Binding, CmisError, Result, Session, SessionParameters};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const REPOSITORY_ID: &str = "A1";
pub const ROOT_ID: &str = "root";

/// How `get_content_stream` fails for an object.
#[derive(Debug, Clone, Copy)]
pub enum ContentFault {
    NotFound,
    NoContent,
}

pub struct ScriptedRepository {
    pub cmis_version: Mutex<CmisVersion>,
    pub report_totals: Mutex<bool>,
    pub objects: Mutex<BTreeMap<String, ObjectData>>,
    pub paths: Mutex<BTreeMap<String, String>>,
    pub children: Mutex<BTreeMap<String, Vec<String>>>,
    pub relationships: Mutex<BTreeMap<String, Vec<String>>>,
    pub latest_versions: Mutex<BTreeMap<String, String>>,
    pub changes: Mutex<Vec<ObjectData>>,
    pub types: Mutex<BTreeMap<String, TypeDefinition>>,
    pub content_faults: Mutex<BTreeMap<String, ContentFault>>,
    pub tree_failures: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
}

fn properties(pairs: Vec<(&str, serde_json::Value)>) -> Properties {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

pub fn folder_data(id: &str, path: &str, parent: Option<&str>) -> ObjectData {
    let mut props = properties(vec![
        (PropertyIds::OBJECT_ID, json!(id)),
        (PropertyIds::BASE_TYPE_ID, json!("cmis:folder")),
        (PropertyIds::OBJECT_TYPE_ID, json!("cmis:folder")),
        (PropertyIds::PATH, json!(path)),
        (PropertyIds::NAME, json!(path.rsplit('/').next().unwrap_or(path))),
    ]);
    if let Some(parent) = parent {
        props.insert(PropertyIds::PARENT_ID.to_string(), json!(parent));
    }
    ObjectData::new(props)
}

pub fn document_data(id: &str, name: &str, version_series_id: &str) -> ObjectData {
    ObjectData::new(properties(vec![
        (PropertyIds::OBJECT_ID, json!(id)),
        (PropertyIds::BASE_TYPE_ID, json!("cmis:document")),
        (PropertyIds::OBJECT_TYPE_ID, json!("my:doc")),
        (PropertyIds::NAME, json!(name)),
        (PropertyIds::VERSION_SERIES_ID, json!(version_series_id)),
    ]))
}

pub fn relationship_data(id: &str, source: &str, target: &str) -> ObjectData {
    ObjectData::new(properties(vec![
        (PropertyIds::OBJECT_ID, json!(id)),
        (PropertyIds::BASE_TYPE_ID, json!("cmis:relationship")),
        (PropertyIds::OBJECT_TYPE_ID, json!("cmis:relationship")),
        (PropertyIds::SOURCE_ID, json!(source)),
        (PropertyIds::TARGET_ID, json!(target)),
    ]))
}

pub fn change_data(object_id: &str, change_type: ChangeType) -> ObjectData {
    let mut data = ObjectData::new(properties(vec![(PropertyIds::OBJECT_ID, json!(object_id))]));
    data.change_event_info = Some(ChangeEventInfo {
        change_type,
        change_time: None,
    });
    data
}

/// Slice `items` the way a repository pages results.
fn slice<T: Clone>(items: &[T], max_items: u64, skip_count: u64) -> (Vec<T>, bool) {
    let len = items.len() as u64;
    let start = skip_count.min(len);
    let end = skip_count.saturating_add(max_items).min(len);
    (items[start as usize..end as usize].to_vec(), end < len)
}

impl ScriptedRepository {
    /// Root folder `/` with no content, CMIS 1.1, versionable documents.
    pub fn new() -> Self {
        let repo = Self {
            cmis_version: Mutex::new(CmisVersion::Cmis11),
            report_totals: Mutex::new(true),
            objects: Mutex::new(BTreeMap::new()),
            paths: Mutex::new(BTreeMap::new()),
            children: Mutex::new(BTreeMap::new()),
            relationships: Mutex::new(BTreeMap::new()),
            latest_versions: Mutex::new(BTreeMap::new()),
            changes: Mutex::new(Vec::new()),
            types: Mutex::new(BTreeMap::new()),
            content_faults: Mutex::new(BTreeMap::new()),
            tree_failures: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        };

        let mut document = TypeDefinition::new("cmis:document", BaseTypeId::Document);
        document.versionable = Some(true);
        repo.add_type(document);
        repo.add_type(TypeDefinition::new("cmis:folder", BaseTypeId::Folder));
        repo.add_type(TypeDefinition::new("cmis:relationship", BaseTypeId::Relationship));
        let mut my_doc = TypeDefinition::new("my:doc", BaseTypeId::Document);
        my_doc.query_name = "my_doc".to_string();
        my_doc.parent_type_id = Some("cmis:document".to_string());
        repo.add_type(my_doc);

        repo.add_object(folder_data(ROOT_ID, "/", None), Some("/"));
        repo
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn add_type(&self, definition: TypeDefinition) {
        self.types
            .lock()
            .unwrap()
            .insert(definition.id.clone(), definition);
    }

    pub fn add_object(&self, data: ObjectData, path: Option<&str>) {
        let id = data.id().unwrap().to_string();
        if let Some(path) = path {
            self.paths.lock().unwrap().insert(path.to_string(), id.clone());
        }
        if let Some(parent) = data
            .properties
            .get(PropertyIds::PARENT_ID)
            .and_then(|v| v.as_str())
        {
            self.children
                .lock()
                .unwrap()
                .entry(parent.to_string())
                .or_default()
                .push(id.clone());
        }
        self.objects.lock().unwrap().insert(id, data);
    }

    /// Add a document as a child of `folder_id`.
    pub fn add_document(&self, folder_id: &str, id: &str, name: &str) {
        let mut data = document_data(id, name, &format!("vs-{}", id));
        data.properties
            .insert(PropertyIds::PARENT_ID.to_string(), json!(folder_id));
        self.add_object(data, None);
    }

    pub fn add_relationship(&self, id: &str, source: &str, target: &str) {
        self.add_object(relationship_data(id, source, target), None);
        self.relationships
            .lock()
            .unwrap()
            .entry(source.to_string())
            .or_default()
            .push(id.to_string());
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of logged calls starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn lookup(&self, object_id: &str) -> Result<ObjectData> {
        self.objects
            .lock()
            .unwrap()
            .get(object_id)
            .cloned()
            .ok_or_else(|| CmisError::not_found(format!("No object '{}'", object_id)))
    }

    fn total(&self, len: usize) -> Option<u64> {
        if *self.report_totals.lock().unwrap() {
            Some(len as u64)
        } else {
            None
        }
    }
}

/// Session over `repo` with default parameters.
pub fn session(repo: &Arc<ScriptedRepository>) -> Session {
    session_with(repo, SessionParameters::for_repository(REPOSITORY_ID))
}

pub fn session_with(repo: &Arc<ScriptedRepository>, parameters: SessionParameters) -> Session {
    Session::builder(parameters)
        .with_binding(Binding::from_service(repo.clone()))
        .build()
        .expect("session")
}

impl RepositoryService for ScriptedRepository {
    fn get_repository_infos(&self) -> Result<Vec<RepositoryInfo>> {
        self.record("get_repository_infos".into());
        Ok(vec![self.get_repository_info(REPOSITORY_ID)?])
    }

    fn get_repository_info(&self, repository_id: &str) -> Result<RepositoryInfo> {
        self.record(format!("get_repository_info:{}", repository_id));
        if repository_id != REPOSITORY_ID {
            return Err(CmisError::not_found(format!("No repository '{}'", repository_id)));
        }
        let mut info = RepositoryInfo::new(REPOSITORY_ID, ROOT_ID);
        info.cmis_version = *self.cmis_version.lock().unwrap();
        Ok(info)
    }

    fn get_type_definition(&self, _repository_id: &str, type_id: &str) -> Result<TypeDefinition> {
        self.record(format!("get_type_definition:{}", type_id));
        self.types
            .lock()
            .unwrap()
            .get(type_id)
            .cloned()
            .ok_or_else(|| CmisError::not_found(format!("No type '{}'", type_id)))
    }

    fn get_type_children(
        &self,
        _repository_id: &str,
        type_id: Option<&str>,
        _include_property_definitions: bool,
        max_items: u64,
        skip_count: u64,
    ) -> Result<TypeDefinitionList> {
        self.record(format!("get_type_children:{}", skip_count));
        let children: Vec<TypeDefinition> = self
            .types
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.parent_type_id.as_deref() == type_id)
            .cloned()
            .collect();
        let (list, has_more_items) = slice(&children, max_items, skip_count);
        Ok(TypeDefinitionList {
            list,
            num_items: self.total(children.len()),
            has_more_items,
        })
    }

    fn get_type_descendants(
        &self,
        _repository_id: &str,
        type_id: Option<&str>,
        _depth: Option<i64>,
        _include_property_definitions: bool,
    ) -> Result<Vec<TypeDefinitionContainer>> {
        self.record("get_type_descendants".into());
        let types = self.types.lock().unwrap().clone();
        fn build(
            types: &BTreeMap<String, TypeDefinition>,
            parent: Option<&str>,
        ) -> Vec<TypeDefinitionContainer> {
            types
                .values()
                .filter(|t| t.parent_type_id.as_deref() == parent)
                .map(|t| TypeDefinitionContainer {
                    type_definition: t.clone(),
                    children: build(types, Some(&t.id)),
                })
                .collect()
        }
        Ok(build(&types, type_id))
    }

    fn create_type(&self, _repository_id: &str, definition: &TypeDefinition) -> Result<TypeDefinition> {
        self.record(format!("create_type:{}", definition.id));
        self.add_type(definition.clone());
        Ok(definition.clone())
    }

    fn update_type(&self, _repository_id: &str, definition: &TypeDefinition) -> Result<TypeDefinition> {
        self.record(format!("update_type:{}", definition.id));
        self.add_type(definition.clone());
        Ok(definition.clone())
    }

    fn delete_type(&self, _repository_id: &str, type_id: &str) -> Result<()> {
        self.record(format!("delete_type:{}", type_id));
        self.types.lock().unwrap().remove(type_id);
        Ok(())
    }
}

impl ObjectService for ScriptedRepository {
    fn get_object(
        &self,
        _repository_id: &str,
        object_id: &str,
        _context: &OperationContext,
    ) -> Result<ObjectData> {
        self.record(format!("get_object:{}", object_id));
        self.lookup(object_id)
    }

    fn get_object_by_path(
        &self,
        _repository_id: &str,
        path: &str,
        _context: &OperationContext,
    ) -> Result<ObjectData> {
        self.record(format!("get_object_by_path:{}", path));
        let id = self
            .paths
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| CmisError::not_found(format!("No object at '{}'", path)))?;
        self.lookup(&id)
    }

    fn get_content_stream(
        &self,
        _repository_id: &str,
        object_id: &str,
        _stream_id: Option<&str>,
        _offset: Option<u64>,
        _length: Option<u64>,
    ) -> Result<ContentStream> {
        self.record(format!("get_content_stream:{}", object_id));
        match self.content_faults.lock().unwrap().get(object_id) {
            Some(ContentFault::NotFound) => Err(CmisError::not_found(object_id)),
            Some(ContentFault::NoContent) => Err(CmisError::Constraint {
                message: "no content".into(),
            }),
            None => Ok(ContentStream {
                filename: Some(format!("{}.txt", object_id)),
                mime_type: Some("text/plain".into()),
                length: Some(5),
                stream: b"hello".to_vec(),
            }),
        }
    }

    fn create_folder(
        &self,
        _repository_id: &str,
        properties: &Properties,
        folder_id: &str,
    ) -> Result<String> {
        self.record(format!("create_folder:{}", folder_id));
        let id = format!("folder-{}", properties.len());
        Ok(id)
    }

    fn create_document(
        &self,
        _repository_id: &str,
        properties: &Properties,
        _folder_id: Option<&str>,
        _content: Option<&ContentStream>,
    ) -> Result<String> {
        self.record("create_document".into());
        Ok(format!("doc-{}", properties.len()))
    }

    fn delete_object(&self, _repository_id: &str, object_id: &str, _all_versions: bool) -> Result<()> {
        self.record(format!("delete_object:{}", object_id));
        self.objects.lock().unwrap().remove(object_id);
        Ok(())
    }

    fn delete_tree(
        &self,
        _repository_id: &str,
        folder_id: &str,
        _all_versions: bool,
        _continue_on_failure: bool,
    ) -> Result<FailedToDelete> {
        self.record(format!("delete_tree:{}", folder_id));
        Ok(FailedToDelete {
            ids: self.tree_failures.lock().unwrap().clone(),
        })
    }
}

impl NavigationService for ScriptedRepository {
    fn get_children(
        &self,
        _repository_id: &str,
        folder_id: &str,
        _context: &OperationContext,
        max_items: u64,
        skip_count: u64,
    ) -> Result<ObjectInFolderList> {
        self.record(format!("get_children:{}:{}", folder_id, skip_count));
        let ids = self
            .children
            .lock()
            .unwrap()
            .get(folder_id)
            .cloned()
            .unwrap_or_default();
        let (page, has_more_items) = slice(&ids, max_items, skip_count);
        let objects = page
            .iter()
            .map(|id| {
                Ok(ObjectInFolderData {
                    object: self.lookup(id)?,
                    path_segment: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(ObjectInFolderList {
            objects,
            num_items: self.total(ids.len()),
            has_more_items,
        })
    }

    fn get_descendants(
        &self,
        _repository_id: &str,
        folder_id: &str,
        depth: i64,
        _context: &OperationContext,
    ) -> Result<Vec<ObjectInFolderContainer>> {
        self.record(format!("get_descendants:{}", folder_id));
        self.tree(folder_id, depth, false)
    }

    fn get_folder_tree(
        &self,
        _repository_id: &str,
        folder_id: &str,
        depth: i64,
        _context: &OperationContext,
    ) -> Result<Vec<ObjectInFolderContainer>> {
        self.record(format!("get_folder_tree:{}", folder_id));
        self.tree(folder_id, depth, true)
    }
}

impl ScriptedRepository {
    fn tree(
        &self,
        folder_id: &str,
        depth: i64,
        folders_only: bool,
    ) -> Result<Vec<ObjectInFolderContainer>> {
        if depth == 0 {
            return Ok(Vec::new());
        }
        let ids = self
            .children
            .lock()
            .unwrap()
            .get(folder_id)
            .cloned()
            .unwrap_or_default();

        let mut nodes = Vec::new();
        for id in ids {
            let object = self.lookup(&id)?;
            let is_folder = object.properties.get(PropertyIds::BASE_TYPE_ID)
                == Some(&json!("cmis:folder"));
            if folders_only && !is_folder {
                continue;
            }
            nodes.push(ObjectInFolderContainer {
                object: ObjectInFolderData {
                    object,
                    path_segment: None,
                },
                children: self.tree(&id, depth - 1, folders_only)?,
            });
        }
        Ok(nodes)
    }
}

impl DiscoveryService for ScriptedRepository {
    fn query(
        &self,
        _repository_id: &str,
        statement: &str,
        _search_all_versions: bool,
        _context: &OperationContext,
        max_items: u64,
        skip_count: u64,
    ) -> Result<ObjectList> {
        self.record(format!("query:{}:{}", skip_count, statement));
        let documents: Vec<ObjectData> = self
            .objects
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.properties.get(PropertyIds::BASE_TYPE_ID) == Some(&json!("cmis:document")))
            .cloned()
            .collect();
        let (objects, has_more_items) = slice(&documents, max_items, skip_count);
        Ok(ObjectList {
            objects,
            num_items: self.total(documents.len()),
            has_more_items,
        })
    }

    /// Entries from the token's position on, repeating the entry the token
    /// points at. The returned token points at the last entry served.
    fn get_content_changes(
        &self,
        _repository_id: &str,
        change_log_token: Option<&str>,
        _include_properties: bool,
        _context: &OperationContext,
        max_items: u64,
    ) -> Result<ContentChanges> {
        self.record(format!(
            "get_content_changes:{}",
            change_log_token.unwrap_or("-")
        ));
        let changes = self.changes.lock().unwrap().clone();
        let start = match change_log_token {
            Some(token) => token
                .parse::<u64>()
                .map_err(|_| CmisError::invalid_argument("bad token"))?,
            None => 0,
        };
        let (objects, has_more_items) = slice(&changes, max_items, start);
        let last = start + objects.len() as u64;
        Ok(ContentChanges {
            list: ObjectList {
                objects,
                num_items: None,
                has_more_items,
            },
            next_change_log_token: Some(last.saturating_sub(1).to_string()),
        })
    }
}

impl RelationshipService for ScriptedRepository {
    fn get_object_relationships(
        &self,
        _repository_id: &str,
        object_id: &str,
        _include_sub_relationship_types: bool,
        _direction: RelationshipDirection,
        _type_id: Option<&str>,
        _context: &OperationContext,
        max_items: u64,
        skip_count: u64,
    ) -> Result<ObjectList> {
        self.record(format!("get_object_relationships:{}:{}", object_id, skip_count));
        let ids = self
            .relationships
            .lock()
            .unwrap()
            .get(object_id)
            .cloned()
            .unwrap_or_default();
        let (page, has_more_items) = slice(&ids, max_items, skip_count);
        let objects = page
            .iter()
            .map(|id| {
                ObjectData::new(properties(vec![(PropertyIds::OBJECT_ID, json!(id))]))
            })
            .collect();
        Ok(ObjectList {
            objects,
            num_items: self.total(ids.len()),
            has_more_items,
        })
    }
}

impl VersioningService for ScriptedRepository {
    fn get_object_of_latest_version(
        &self,
        _repository_id: &str,
        object_id: &str,
        version_series_id: Option<&str>,
        _major: bool,
        _context: &OperationContext,
    ) -> Result<ObjectData> {
        self.record(format!(
            "get_object_of_latest_version:{}:{}",
            object_id,
            version_series_id.unwrap_or("-")
        ));
        let latest = self
            .latest_versions
            .lock()
            .unwrap()
            .get(object_id)
            .cloned()
            .unwrap_or_else(|| object_id.to_string());
        self.lookup(&latest)
    }
}

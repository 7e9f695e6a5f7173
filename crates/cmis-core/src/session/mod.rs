//! Sessions: the cache-aware entry point to one repository.
//!
//! A [`Session`] consults the [`ObjectCache`] before every object read,
//! writes fetched objects back, evicts on deletion, and exposes listings as
//! [`PagedCollection`]s that fetch nothing until read.

mod builder;
mod link;

pub use builder::{SessionBuilder, SessionFactory};
pub use link::SessionLink;

use crate::binding::{CmisBinding, RepositoryService};
use crate::cache::ObjectCache;
use crate::config::SessionParameters;
use crate::error::{CmisError, Result};
use crate::factory::ObjectFactory;
use crate::models::{
    BaseTypeId, ChangeEvent, CmisObject, CmisVersion, ContentStream, ObjectData,
    OperationContext, Properties, QueryResult, RelationshipDirection, RepositoryInfo, Tree,
    TypeDefinition, TypeDefinitionContainer,
};
use crate::paging::{ContinuationPageFetcher, FnPageFetcher, Page, PagedCollection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

pub(crate) struct SessionInner {
    id: Uuid,
    link: SessionLink,
    parameters: SessionParameters,
    repository_info: RepositoryInfo,
    binding: Arc<CmisBinding>,
    object_factory: Arc<dyn ObjectFactory>,
    cache: ObjectCache,
    default_context: RwLock<OperationContext>,
    object_types: Mutex<HashMap<String, TypeDefinition>>,
}

/// Connection to one repository.
///
/// Cloning is cheap; clones share the caches. Objects handed out carry a
/// [`SessionLink`] back to the session that read them.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Start configuring a session.
    pub fn builder(parameters: SessionParameters) -> SessionBuilder {
        SessionBuilder::new(parameters)
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn link(&self) -> SessionLink {
        self.inner.link.clone()
    }

    pub fn parameters(&self) -> &SessionParameters {
        &self.inner.parameters
    }

    pub fn repository_info(&self) -> &RepositoryInfo {
        &self.inner.repository_info
    }

    pub fn repository_id(&self) -> &str {
        &self.inner.repository_info.id
    }

    pub fn binding(&self) -> &CmisBinding {
        &self.inner.binding
    }

    pub fn object_factory(&self) -> &dyn ObjectFactory {
        self.inner.object_factory.as_ref()
    }

    pub fn cache(&self) -> &ObjectCache {
        &self.inner.cache
    }

    pub fn default_context(&self) -> OperationContext {
        match self.inner.default_context.read() {
            Ok(context) => context.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_default_context(&self, context: OperationContext) {
        match self.inner.default_context.write() {
            Ok(mut current) => *current = context,
            Err(poisoned) => *poisoned.into_inner() = context,
        }
    }

    /// A fresh context with the session's page size and caching enabled.
    pub fn create_operation_context(&self) -> OperationContext {
        OperationContext::new().with_max_items_per_page(self.inner.parameters.max_items_per_page)
    }

    fn object_types(&self) -> MutexGuard<'_, HashMap<String, TypeDefinition>> {
        self.inner
            .object_types
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn convert(&self, data: &ObjectData, context: &OperationContext) -> Result<CmisObject> {
        let mut object = self.inner.object_factory.convert_object(data, context)?;
        object.refresh_session(&self.inner.link);
        Ok(object)
    }

    fn attach_trees(&self, trees: &mut [Tree<CmisObject>]) {
        for tree in trees {
            tree.item.refresh_session(&self.inner.link);
            self.attach_trees(&mut tree.children);
        }
    }

    // ---- objects ----

    /// Object by id, from the cache when the context allows it.
    pub fn get_object(&self, object_id: &str, context: &OperationContext) -> Result<CmisObject> {
        if object_id.is_empty() {
            return Err(CmisError::invalid_argument("Object id must not be empty"));
        }

        let cache_key = context.cache_key();
        if context.is_cache_enabled() {
            if let Some(object) = self.inner.cache.get_by_id(object_id, &cache_key) {
                return Ok(object);
            }
        }

        let data = self
            .binding()
            .object_service()
            .get_object(self.repository_id(), object_id, context)?;
        let object = self.convert(&data, context)?;

        if context.is_cache_enabled() {
            self.inner.cache.put(&object, &cache_key);
        }
        Ok(object)
    }

    /// Object by path. The path index is skipped when the session was
    /// configured with `cache_path_omit`.
    pub fn get_object_by_path(&self, path: &str, context: &OperationContext) -> Result<CmisObject> {
        if path.is_empty() {
            return Err(CmisError::invalid_argument("Path must not be empty"));
        }

        let cache_key = context.cache_key();
        if context.is_cache_enabled() && !self.inner.parameters.cache_path_omit {
            if let Some(object) = self.inner.cache.get_by_path(path, &cache_key) {
                return Ok(object);
            }
        }

        let data = self
            .binding()
            .object_service()
            .get_object_by_path(self.repository_id(), path, context)?;
        let object = self.convert(&data, context)?;

        if context.is_cache_enabled() {
            self.inner.cache.put_path(path, &object, &cache_key);
        }
        Ok(object)
    }

    /// Latest version of the document `object_id` belongs to.
    ///
    /// A cached copy of the document supplies the version series id. When
    /// `cmis:document` is not versionable the document itself is returned.
    pub fn get_latest_document_version(
        &self,
        object_id: &str,
        major: bool,
        context: &OperationContext,
    ) -> Result<CmisObject> {
        if object_id.is_empty() {
            return Err(CmisError::invalid_argument("Object id must not be empty"));
        }

        let cache_key = context.cache_key();
        let mut version_series_id = None;
        if context.is_cache_enabled() {
            if let Some(source) = self.inner.cache.get_by_id(object_id, &cache_key) {
                if source.is_document() {
                    let document_type =
                        self.get_type_definition(BaseTypeId::Document.as_str(), true)?;
                    if !document_type.is_versionable() {
                        return self.get_object(source.id(), context);
                    }
                    version_series_id = source.version_series_id().map(str::to_string);
                }
            }
        }

        let data = self.binding().versioning_service().get_object_of_latest_version(
            self.repository_id(),
            object_id,
            version_series_id.as_deref(),
            major,
            context,
        )?;
        let result = self.convert(&data, context)?;

        if context.is_cache_enabled() {
            self.inner.cache.put(&result, &cache_key);
        }

        if !result.is_document() {
            return Err(CmisError::invalid_argument("Latest version is not a document"));
        }
        Ok(result)
    }

    pub fn get_root_folder(&self, context: &OperationContext) -> Result<CmisObject> {
        let root_folder_id = self.inner.repository_info.root_folder_id.clone();
        let root = self.get_object(&root_folder_id, context)?;
        if !root.is_folder() {
            return Err(CmisError::runtime("Root folder object is not a folder"));
        }
        Ok(root)
    }

    /// Drop every cached variant of `object_id`.
    pub fn remove_object_from_cache(&self, object_id: &str) {
        self.inner.cache.remove(object_id);
    }

    /// Clear the object cache, the session's type map and the binding
    /// caches. Store-backed caches only delete entries when the deployment
    /// set `allow_cache_clear`.
    pub fn clear(&self) {
        self.inner.cache.clear();
        self.object_types().clear();
        self.binding().clear_all_caches();
    }

    pub fn create_folder(&self, properties: &Properties, folder_id: &str) -> Result<String> {
        if properties.is_empty() {
            return Err(CmisError::invalid_argument("Properties must not be empty"));
        }
        if folder_id.is_empty() {
            return Err(CmisError::invalid_argument("Folder id must be set"));
        }
        self.binding()
            .object_service()
            .create_folder(self.repository_id(), properties, folder_id)
    }

    pub fn create_document(
        &self,
        properties: &Properties,
        folder_id: Option<&str>,
        content: Option<&ContentStream>,
    ) -> Result<String> {
        if properties.is_empty() {
            return Err(CmisError::invalid_argument("Properties must not be empty"));
        }
        self.binding().object_service().create_document(
            self.repository_id(),
            properties,
            folder_id,
            content,
        )
    }

    /// Delete an object and evict it from the cache.
    pub fn delete(&self, object_id: &str, all_versions: bool) -> Result<()> {
        self.binding()
            .object_service()
            .delete_object(self.repository_id(), object_id, all_versions)?;
        self.remove_object_from_cache(object_id);
        Ok(())
    }

    /// Delete a folder tree. Returns the ids that could not be deleted; when
    /// there are any the folder is evicted from the cache.
    pub fn delete_tree(
        &self,
        folder_id: &str,
        all_versions: bool,
        continue_on_failure: bool,
    ) -> Result<Vec<String>> {
        let failed = self.binding().object_service().delete_tree(
            self.repository_id(),
            folder_id,
            all_versions,
            continue_on_failure,
        )?;
        if !failed.ids.is_empty() {
            self.remove_object_from_cache(folder_id);
        }
        Ok(failed.ids)
    }

    /// Content of a document, or `None` if it has none.
    ///
    /// A not-found fault evicts the document from the cache before it is
    /// returned.
    pub fn get_content_stream(
        &self,
        object_id: &str,
        stream_id: Option<&str>,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> Result<Option<ContentStream>> {
        let result = self.binding().object_service().get_content_stream(
            self.repository_id(),
            object_id,
            stream_id,
            offset,
            length,
        );
        match result {
            Ok(stream) => Ok(Some(stream)),
            Err(CmisError::Constraint { .. }) => Ok(None),
            Err(e) if e.is_not_found() => {
                debug!("Content of '{}' not found, evicting", object_id);
                self.remove_object_from_cache(object_id);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    // ---- listings ----

    /// Children of a folder.
    pub fn get_children(
        &self,
        folder_id: &str,
        context: &OperationContext,
    ) -> Result<PagedCollection<CmisObject>> {
        if folder_id.is_empty() {
            return Err(CmisError::invalid_argument("Folder id must not be empty"));
        }

        let session = self.clone();
        let context = context.clone();
        let folder_id = folder_id.to_string();
        let fetcher = FnPageFetcher::new(context.max_items_per_page(), move |skip, max| {
            let list = session.binding().navigation_service().get_children(
                session.repository_id(),
                &folder_id,
                &context,
                max,
                skip,
            )?;
            let items = list
                .objects
                .iter()
                .map(|child| session.convert(&child.object, &context))
                .collect::<Result<Vec<_>>>()?;
            Ok(Page::new(items, list.num_items, list.has_more_items))
        });
        Ok(PagedCollection::new(0, Arc::new(fetcher)))
    }

    pub fn get_descendants(
        &self,
        folder_id: &str,
        depth: i64,
        context: &OperationContext,
    ) -> Result<Vec<Tree<CmisObject>>> {
        let containers = self.binding().navigation_service().get_descendants(
            self.repository_id(),
            folder_id,
            depth,
            context,
        )?;
        let mut trees = self.object_factory().convert_tree(&containers, context)?;
        self.attach_trees(&mut trees);
        Ok(trees)
    }

    pub fn get_folder_tree(
        &self,
        folder_id: &str,
        depth: i64,
        context: &OperationContext,
    ) -> Result<Vec<Tree<CmisObject>>> {
        let containers = self.binding().navigation_service().get_folder_tree(
            self.repository_id(),
            folder_id,
            depth,
            context,
        )?;
        let mut trees = self.object_factory().convert_tree(&containers, context)?;
        self.attach_trees(&mut trees);
        Ok(trees)
    }

    /// Run a CMIS query.
    pub fn query(
        &self,
        statement: &str,
        search_all_versions: bool,
        context: &OperationContext,
    ) -> Result<PagedCollection<QueryResult>> {
        if statement.trim().is_empty() {
            return Err(CmisError::invalid_argument("Statement must not be empty"));
        }

        let session = self.clone();
        let context = context.clone();
        let statement = statement.to_string();
        let fetcher = FnPageFetcher::new(context.max_items_per_page(), move |skip, max| {
            let list = session.binding().discovery_service().query(
                session.repository_id(),
                &statement,
                search_all_versions,
                &context,
                max,
                skip,
            )?;
            let items = list
                .objects
                .iter()
                .map(|data| session.object_factory().convert_query_result(data))
                .collect::<Result<Vec<_>>>()?;
            Ok(Page::new(items, list.num_items, list.has_more_items))
        });
        Ok(PagedCollection::new(0, Arc::new(fetcher)))
    }

    /// Objects of one type, optionally filtered by a WHERE clause.
    ///
    /// Resolves the type definition up front to get its query name.
    pub fn query_objects(
        &self,
        type_id: &str,
        where_clause: Option<&str>,
        search_all_versions: bool,
        context: &OperationContext,
    ) -> Result<PagedCollection<CmisObject>> {
        if type_id.is_empty() {
            return Err(CmisError::invalid_argument("Type id must not be empty"));
        }

        let definition = self.get_type_definition(type_id, true)?;
        let statement = build_query_statement(&definition.query_name, where_clause, context);
        debug!("Query objects statement: {}", statement);

        let session = self.clone();
        let context = context.clone();
        let fetcher = FnPageFetcher::new(context.max_items_per_page(), move |skip, max| {
            let list = session.binding().discovery_service().query(
                session.repository_id(),
                &statement,
                search_all_versions,
                &context,
                max,
                skip,
            )?;
            let items = list
                .objects
                .iter()
                .map(|data| session.convert(data, &context))
                .collect::<Result<Vec<_>>>()?;
            Ok(Page::new(items, list.num_items, list.has_more_items))
        });
        Ok(PagedCollection::new(0, Arc::new(fetcher)))
    }

    /// Change-log entries after `change_log_token`.
    ///
    /// Without `max_num_items` each request asks for everything. Every
    /// request continues from the token returned by the one before it, and
    /// views made with `skip_to` or `get_page` replay those tokens from the
    /// start of the log.
    pub fn get_content_changes(
        &self,
        change_log_token: Option<&str>,
        include_properties: bool,
        max_num_items: Option<u64>,
        context: &OperationContext,
    ) -> PagedCollection<ChangeEvent> {
        let session = self.clone();
        let context = context.clone();
        let page_size = max_num_items.filter(|max| *max > 0).unwrap_or(u64::MAX);

        let fetcher = ContinuationPageFetcher::new(
            change_log_token.map(str::to_string),
            page_size,
            move |token: Option<&str>, max| {
                let changes = session.binding().discovery_service().get_content_changes(
                    session.repository_id(),
                    token,
                    include_properties,
                    &context,
                    max,
                )?;
                let items = changes
                    .list
                    .objects
                    .iter()
                    .map(|data| session.object_factory().convert_change_event(data))
                    .collect::<Result<Vec<_>>>()?;
                let page = Page::new(items, changes.list.num_items, changes.list.has_more_items);
                Ok((page, changes.next_change_log_token))
            },
        );
        PagedCollection::new(0, Arc::new(fetcher))
    }

    /// Relationships of an object. Each relationship is read through
    /// [`get_object`](Self::get_object) and therefore through the cache.
    pub fn get_relationships(
        &self,
        object_id: &str,
        include_sub_relationship_types: bool,
        direction: RelationshipDirection,
        type_id: Option<&str>,
        context: &OperationContext,
    ) -> Result<PagedCollection<CmisObject>> {
        if object_id.is_empty() {
            return Err(CmisError::invalid_argument("Object id must not be empty"));
        }

        let session = self.clone();
        let context = context.clone();
        let object_id = object_id.to_string();
        let type_id = type_id.map(str::to_string);
        let fetcher = FnPageFetcher::new(context.max_items_per_page(), move |skip, max| {
            let list = session.binding().relationship_service().get_object_relationships(
                session.repository_id(),
                &object_id,
                include_sub_relationship_types,
                direction,
                type_id.as_deref(),
                &context,
                max,
                skip,
            )?;

            let mut items = Vec::with_capacity(list.objects.len());
            for data in &list.objects {
                let id = data
                    .id()
                    .ok_or_else(|| CmisError::runtime("Relationship entry has no object id"))?;
                let relationship = session.get_object(id, &context)?;
                if !relationship.is_relationship() {
                    return Err(CmisError::runtime(
                        "Repository returned an object that is not a relationship",
                    ));
                }
                items.push(relationship);
            }
            Ok(Page::new(items, list.num_items, list.has_more_items))
        });
        Ok(PagedCollection::new(0, Arc::new(fetcher)))
    }

    // ---- types ----

    fn ensure_type_mutations_supported(&self) -> Result<()> {
        if self.inner.repository_info.cmis_version == CmisVersion::Cmis10 {
            return Err(CmisError::NotSupported {
                message: "This method is not supported for CMIS 1.0 repositories".to_string(),
            });
        }
        Ok(())
    }

    /// Type definition, from the session's type map or the binding cache
    /// unless `use_cache` is false.
    pub fn get_type_definition(&self, type_id: &str, use_cache: bool) -> Result<TypeDefinition> {
        if use_cache {
            if let Some(definition) = self.object_types().get(type_id) {
                return Ok(definition.clone());
            }
        }

        let definition = self.binding().repository_service().get_type_definition_with(
            self.repository_id(),
            type_id,
            use_cache,
        )?;
        self.object_types()
            .insert(definition.id.clone(), definition.clone());
        Ok(definition)
    }

    /// Direct subtypes of `type_id`, or the base types when `None`.
    pub fn get_type_children(
        &self,
        type_id: Option<&str>,
        include_property_definitions: bool,
    ) -> PagedCollection<TypeDefinition> {
        let session = self.clone();
        let type_id = type_id.map(str::to_string);
        let page_size = self.default_context().max_items_per_page();
        let fetcher = FnPageFetcher::new(page_size, move |skip, max| {
            let list = session.binding().repository_service().get_type_children(
                session.repository_id(),
                type_id.as_deref(),
                include_property_definitions,
                max,
                skip,
            )?;
            Ok(Page::new(list.list, list.num_items, list.has_more_items))
        });
        PagedCollection::new(0, Arc::new(fetcher))
    }

    pub fn get_type_descendants(
        &self,
        type_id: Option<&str>,
        depth: Option<i64>,
        include_property_definitions: bool,
    ) -> Result<Vec<TypeDefinitionContainer>> {
        self.binding().repository_service().get_type_descendants(
            self.repository_id(),
            type_id,
            depth,
            include_property_definitions,
        )
    }

    pub fn create_type(&self, definition: &TypeDefinition) -> Result<TypeDefinition> {
        self.ensure_type_mutations_supported()?;
        self.binding()
            .repository_service()
            .create_type(self.repository_id(), definition)
    }

    pub fn update_type(&self, definition: &TypeDefinition) -> Result<TypeDefinition> {
        self.ensure_type_mutations_supported()?;
        let updated = self
            .binding()
            .repository_service()
            .update_type(self.repository_id(), definition)?;
        self.object_types().remove(&updated.id);
        Ok(updated)
    }

    pub fn delete_type(&self, type_id: &str) -> Result<()> {
        self.ensure_type_mutations_supported()?;
        self.binding()
            .repository_service()
            .delete_type(self.repository_id(), type_id)?;
        self.object_types().remove(type_id);
        Ok(())
    }
}

/// `SELECT <filter or *> FROM <query name> [WHERE ..] [ORDER BY ..]`
fn build_query_statement(
    query_name: &str,
    where_clause: Option<&str>,
    context: &OperationContext,
) -> String {
    let select = context
        .query_filter_string()
        .unwrap_or_else(|| "*".to_string());
    let mut statement = format!("SELECT {} FROM {}", select, query_name);
    if let Some(clause) = where_clause.filter(|c| !c.trim().is_empty()) {
        statement.push_str(" WHERE ");
        statement.push_str(clause);
    }
    if let Some(order_by) = context.order_by().filter(|o| !o.trim().is_empty()) {
        statement.push_str(" ORDER BY ");
        statement.push_str(order_by);
    }
    statement
}

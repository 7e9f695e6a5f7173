//! Repository service decorator backed by the binding caches.

use super::services::RepositoryService;
use crate::cache::{RepositoryInfoCache, TypeDefinitionCache};
use crate::error::{CmisError, Result};
use crate::models::{RepositoryInfo, TypeDefinition, TypeDefinitionContainer, TypeDefinitionList};
use std::sync::Arc;
use tracing::debug;

/// Wraps a raw [`RepositoryService`], answering repository-info and
/// type-definition reads from the caches where possible and keeping the
/// caches in step with type mutations.
pub struct CachingRepositoryService {
    inner: Arc<dyn RepositoryService>,
    repository_infos: RepositoryInfoCache,
    type_definitions: TypeDefinitionCache,
}

impl CachingRepositoryService {
    pub fn new(
        inner: Arc<dyn RepositoryService>,
        repository_infos: RepositoryInfoCache,
        type_definitions: TypeDefinitionCache,
    ) -> Self {
        Self {
            inner,
            repository_infos,
            type_definitions,
        }
    }

    pub fn repository_info_cache(&self) -> &RepositoryInfoCache {
        &self.repository_infos
    }

    pub fn type_definition_cache(&self) -> &TypeDefinitionCache {
        &self.type_definitions
    }

    /// Type definition, from the cache unless `use_cache` is false. Fetched
    /// definitions are cached when `use_cache` is set.
    pub fn get_type_definition_with(
        &self,
        repository_id: &str,
        type_id: &str,
        use_cache: bool,
    ) -> Result<TypeDefinition> {
        if type_id.is_empty() {
            return Err(CmisError::invalid_argument("Type id must not be empty"));
        }
        if use_cache {
            if let Some(definition) = self.type_definitions.get(repository_id, type_id) {
                return Ok(definition);
            }
        }

        let definition = self.inner.get_type_definition(repository_id, type_id)?;
        if use_cache {
            self.type_definitions.put(repository_id, &definition);
        }
        Ok(definition)
    }

    /// Forget the repository's descriptor and root type key.
    pub fn clear_repository_cache(&self, repository_id: &str) {
        debug!("Clearing binding caches for repository '{}'", repository_id);
        self.repository_infos.remove(repository_id);
        self.type_definitions.remove(repository_id, None);
    }

    /// Drop all cached type definitions, where the deployment allows it.
    pub fn clear_all_caches(&self) {
        self.type_definitions.remove_all();
    }
}

impl RepositoryService for CachingRepositoryService {
    fn get_repository_infos(&self) -> Result<Vec<RepositoryInfo>> {
        let infos = self.inner.get_repository_infos()?;
        for info in &infos {
            self.repository_infos.put(info);
        }
        Ok(infos)
    }

    fn get_repository_info(&self, repository_id: &str) -> Result<RepositoryInfo> {
        if let Some(info) = self.repository_infos.get(repository_id) {
            return Ok(info);
        }

        let info = self.inner.get_repository_info(repository_id)?;
        if info.id != repository_id {
            return Err(CmisError::not_found(format!(
                "Repository '{}' not found",
                repository_id
            )));
        }
        self.repository_infos.put(&info);
        Ok(info)
    }

    fn get_type_definition(&self, repository_id: &str, type_id: &str) -> Result<TypeDefinition> {
        self.get_type_definition_with(repository_id, type_id, true)
    }

    fn get_type_children(
        &self,
        repository_id: &str,
        type_id: Option<&str>,
        include_property_definitions: bool,
        max_items: u64,
        skip_count: u64,
    ) -> Result<TypeDefinitionList> {
        let list = self.inner.get_type_children(
            repository_id,
            type_id,
            include_property_definitions,
            max_items,
            skip_count,
        )?;
        if include_property_definitions {
            for definition in &list.list {
                self.type_definitions.put(repository_id, definition);
            }
        }
        Ok(list)
    }

    fn get_type_descendants(
        &self,
        repository_id: &str,
        type_id: Option<&str>,
        depth: Option<i64>,
        include_property_definitions: bool,
    ) -> Result<Vec<TypeDefinitionContainer>> {
        let containers = self.inner.get_type_descendants(
            repository_id,
            type_id,
            depth,
            include_property_definitions,
        )?;
        if include_property_definitions {
            for container in &containers {
                container.walk(&mut |definition| {
                    self.type_definitions.put(repository_id, definition)
                });
            }
        }
        Ok(containers)
    }

    fn create_type(
        &self,
        repository_id: &str,
        definition: &TypeDefinition,
    ) -> Result<TypeDefinition> {
        let created = self.inner.create_type(repository_id, definition)?;
        self.type_definitions.put(repository_id, &created);
        Ok(created)
    }

    fn update_type(
        &self,
        repository_id: &str,
        definition: &TypeDefinition,
    ) -> Result<TypeDefinition> {
        let updated = self.inner.update_type(repository_id, definition)?;
        self.type_definitions.put(repository_id, &updated);
        Ok(updated)
    }

    fn delete_type(&self, repository_id: &str, type_id: &str) -> Result<()> {
        self.inner.delete_type(repository_id, type_id)?;
        self.type_definitions.remove(repository_id, Some(type_id));
        Ok(())
    }
}

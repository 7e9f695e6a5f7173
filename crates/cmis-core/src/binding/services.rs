//! Contracts of the remote CMIS services.
//!
//! Implementations perform the wire calls (Browser binding or a test double)
//! and hand back raw records. Listing calls take `max_items` and
//! `skip_count` so they can back a [`PageFetcher`](crate::paging::PageFetcher).

use crate::error::Result;
use crate::models::{
    ContentChanges, ContentStream, FailedToDelete, ObjectData, ObjectInFolderContainer,
    ObjectInFolderList, ObjectList, OperationContext, Properties, RelationshipDirection,
    RepositoryInfo, TypeDefinition, TypeDefinitionContainer, TypeDefinitionList,
};

/// Repository descriptors and type definitions.
pub trait RepositoryService: Send + Sync {
    fn get_repository_infos(&self) -> Result<Vec<RepositoryInfo>>;

    /// Descriptor of one repository. Fails with `ObjectNotFound` for an
    /// unknown id.
    fn get_repository_info(&self, repository_id: &str) -> Result<RepositoryInfo>;

    fn get_type_definition(&self, repository_id: &str, type_id: &str) -> Result<TypeDefinition>;

    /// Direct subtypes of `type_id`, or the base types when `None`.
    fn get_type_children(
        &self,
        repository_id: &str,
        type_id: Option<&str>,
        include_property_definitions: bool,
        max_items: u64,
        skip_count: u64,
    ) -> Result<TypeDefinitionList>;

    fn get_type_descendants(
        &self,
        repository_id: &str,
        type_id: Option<&str>,
        depth: Option<i64>,
        include_property_definitions: bool,
    ) -> Result<Vec<TypeDefinitionContainer>>;

    fn create_type(&self, repository_id: &str, definition: &TypeDefinition)
        -> Result<TypeDefinition>;

    fn update_type(&self, repository_id: &str, definition: &TypeDefinition)
        -> Result<TypeDefinition>;

    fn delete_type(&self, repository_id: &str, type_id: &str) -> Result<()>;
}

/// Single-object reads and mutations.
pub trait ObjectService: Send + Sync {
    fn get_object(
        &self,
        repository_id: &str,
        object_id: &str,
        context: &OperationContext,
    ) -> Result<ObjectData>;

    fn get_object_by_path(
        &self,
        repository_id: &str,
        path: &str,
        context: &OperationContext,
    ) -> Result<ObjectData>;

    /// Fails with `Constraint` when the document has no content.
    fn get_content_stream(
        &self,
        repository_id: &str,
        object_id: &str,
        stream_id: Option<&str>,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> Result<ContentStream>;

    /// Returns the id of the new folder.
    fn create_folder(
        &self,
        repository_id: &str,
        properties: &Properties,
        folder_id: &str,
    ) -> Result<String>;

    /// Returns the id of the new document.
    fn create_document(
        &self,
        repository_id: &str,
        properties: &Properties,
        folder_id: Option<&str>,
        content: Option<&ContentStream>,
    ) -> Result<String>;

    fn delete_object(&self, repository_id: &str, object_id: &str, all_versions: bool)
        -> Result<()>;

    fn delete_tree(
        &self,
        repository_id: &str,
        folder_id: &str,
        all_versions: bool,
        continue_on_failure: bool,
    ) -> Result<FailedToDelete>;
}

/// Folder hierarchy listings.
pub trait NavigationService: Send + Sync {
    fn get_children(
        &self,
        repository_id: &str,
        folder_id: &str,
        context: &OperationContext,
        max_items: u64,
        skip_count: u64,
    ) -> Result<ObjectInFolderList>;

    fn get_descendants(
        &self,
        repository_id: &str,
        folder_id: &str,
        depth: i64,
        context: &OperationContext,
    ) -> Result<Vec<ObjectInFolderContainer>>;

    fn get_folder_tree(
        &self,
        repository_id: &str,
        folder_id: &str,
        depth: i64,
        context: &OperationContext,
    ) -> Result<Vec<ObjectInFolderContainer>>;
}

/// Queries and the change log.
pub trait DiscoveryService: Send + Sync {
    fn query(
        &self,
        repository_id: &str,
        statement: &str,
        search_all_versions: bool,
        context: &OperationContext,
        max_items: u64,
        skip_count: u64,
    ) -> Result<ObjectList>;

    /// Changes after `change_log_token`, or from the start of the log when
    /// `None`. The result carries the token to continue from.
    fn get_content_changes(
        &self,
        repository_id: &str,
        change_log_token: Option<&str>,
        include_properties: bool,
        context: &OperationContext,
        max_items: u64,
    ) -> Result<ContentChanges>;
}

/// Relationship listings.
pub trait RelationshipService: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn get_object_relationships(
        &self,
        repository_id: &str,
        object_id: &str,
        include_sub_relationship_types: bool,
        direction: RelationshipDirection,
        type_id: Option<&str>,
        context: &OperationContext,
        max_items: u64,
        skip_count: u64,
    ) -> Result<ObjectList>;
}

/// Version-series reads.
pub trait VersioningService: Send + Sync {
    fn get_object_of_latest_version(
        &self,
        repository_id: &str,
        object_id: &str,
        version_series_id: Option<&str>,
        major: bool,
        context: &OperationContext,
    ) -> Result<ObjectData>;
}

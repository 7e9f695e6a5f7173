//! Remote service layer.
//!
//! The wire protocol lives outside this crate: callers supply
//! implementations of the service traits bundled in a [`Binding`].
//! [`CmisBinding`] puts the binding caches in front of them.

mod caching;
mod services;

pub use caching::CachingRepositoryService;
pub use services::{
    DiscoveryService, NavigationService, ObjectService, RelationshipService, RepositoryService,
    VersioningService,
};

use crate::cache::{RepositoryInfoCache, TypeDefinitionCache};
use crate::config::SessionParameters;
use crate::store::KeyValueStore;
use std::sync::Arc;

/// The raw service implementations of one endpoint.
#[derive(Clone)]
pub struct Binding {
    pub repository: Arc<dyn RepositoryService>,
    pub object: Arc<dyn ObjectService>,
    pub navigation: Arc<dyn NavigationService>,
    pub discovery: Arc<dyn DiscoveryService>,
    pub relationship: Arc<dyn RelationshipService>,
    pub versioning: Arc<dyn VersioningService>,
}

impl Binding {
    /// Bundle one value implementing every service, such as a test double.
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: RepositoryService
            + ObjectService
            + NavigationService
            + DiscoveryService
            + RelationshipService
            + VersioningService
            + 'static,
    {
        Self {
            repository: service.clone(),
            object: service.clone(),
            navigation: service.clone(),
            discovery: service.clone(),
            relationship: service.clone(),
            versioning: service,
        }
    }
}

/// A [`Binding`] whose repository service answers from the repository-info
/// and type-definition caches.
pub struct CmisBinding {
    services: Binding,
    repository: CachingRepositoryService,
}

impl CmisBinding {
    pub fn new(
        services: Binding,
        store: Arc<dyn KeyValueStore>,
        params: &SessionParameters,
    ) -> Self {
        let repository = CachingRepositoryService::new(
            services.repository.clone(),
            RepositoryInfoCache::new(store.clone(), params),
            TypeDefinitionCache::new(store, params),
        );
        Self {
            services,
            repository,
        }
    }

    pub fn repository_service(&self) -> &CachingRepositoryService {
        &self.repository
    }

    pub fn object_service(&self) -> &Arc<dyn ObjectService> {
        &self.services.object
    }

    pub fn navigation_service(&self) -> &Arc<dyn NavigationService> {
        &self.services.navigation
    }

    pub fn discovery_service(&self) -> &Arc<dyn DiscoveryService> {
        &self.services.discovery
    }

    pub fn relationship_service(&self) -> &Arc<dyn RelationshipService> {
        &self.services.relationship
    }

    pub fn versioning_service(&self) -> &Arc<dyn VersioningService> {
        &self.services.versioning
    }

    pub fn clear_all_caches(&self) {
        self.repository.clear_all_caches();
    }

    pub fn clear_repository_cache(&self, repository_id: &str) {
        self.repository.clear_repository_cache(repository_id);
    }
}

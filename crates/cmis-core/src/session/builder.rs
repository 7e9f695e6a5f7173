//! Session construction.

use super::{Session, SessionInner, SessionLink};
use crate::binding::{Binding, CmisBinding, RepositoryService};
use crate::cache::ObjectCache;
use crate::config::SessionParameters;
use crate::error::{CmisError, Result};
use crate::factory::{DefaultObjectFactory, ObjectFactory};
use crate::models::{OperationContext, RepositoryInfo};
use crate::store::{KeyValueStore, MemoryStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

/// Builder for configuring a [`Session`].
///
/// # Example
///
/// ```rust,ignore
/// use cmis_client::{Binding, Session, SessionParameters};
///
/// let session = Session::builder(SessionParameters::for_repository("A1"))
///     .with_binding(Binding::from_service(my_service))
///     .build()?;
/// ```
pub struct SessionBuilder {
    parameters: SessionParameters,
    binding: Option<Binding>,
    store: Option<Arc<dyn KeyValueStore>>,
    object_factory: Option<Arc<dyn ObjectFactory>>,
    default_context: Option<OperationContext>,
}

impl SessionBuilder {
    pub fn new(parameters: SessionParameters) -> Self {
        Self {
            parameters,
            binding: None,
            store: None,
            object_factory: None,
            default_context: None,
        }
    }

    /// Remote services to talk to. Required.
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Backing store for every cache of the session.
    ///
    /// Default: a private [`MemoryStore`].
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Converter for raw binding records.
    ///
    /// Default: [`DefaultObjectFactory`].
    pub fn with_object_factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        self.object_factory = Some(factory);
        self
    }

    /// Context used by callers that do not bring their own.
    ///
    /// Default: caching enabled, page size from the parameters.
    pub fn with_default_context(mut self, context: OperationContext) -> Self {
        self.default_context = Some(context);
        self
    }

    /// Validate the configuration, load the repository info and build the
    /// session.
    pub fn build(self) -> Result<Session> {
        self.parameters.validate()?;
        let repository_id = self
            .parameters
            .repository_id
            .clone()
            .ok_or_else(|| CmisError::invalid_argument("Repository ID is not set"))?;
        let services = self
            .binding
            .ok_or_else(|| CmisError::invalid_argument("No binding configured"))?;

        let store = self.store.unwrap_or_else(|| {
            Arc::new(MemoryStore::with_max_ttl(self.parameters.longest_ttl()))
        });
        let object_factory = self
            .object_factory
            .unwrap_or_else(|| Arc::new(DefaultObjectFactory));
        let default_context = self.default_context.unwrap_or_else(|| {
            OperationContext::new().with_max_items_per_page(self.parameters.max_items_per_page)
        });

        let binding = Arc::new(CmisBinding::new(services, store.clone(), &self.parameters));
        let repository_info = binding
            .repository_service()
            .get_repository_info(&repository_id)?;

        let parameters = self.parameters;
        let id = Uuid::new_v4();
        let inner = Arc::new_cyclic(|weak| {
            let link = SessionLink::new(id, weak.clone());
            SessionInner {
                id,
                cache: ObjectCache::new(store, repository_info.id.clone(), &parameters)
                    .attached_to(link.clone()),
                link,
                parameters,
                repository_info,
                binding,
                object_factory,
                default_context: RwLock::new(default_context),
                object_types: Mutex::new(HashMap::new()),
            }
        });

        info!("Opened session {} for repository '{}'", id, repository_id);
        Ok(Session { inner })
    }
}

/// Creates sessions that share one backing store, so object, type and
/// repository-info entries survive across sessions of the same process.
pub struct SessionFactory {
    store: Arc<dyn KeyValueStore>,
    object_factory: Arc<dyn ObjectFactory>,
}

impl SessionFactory {
    /// Factory over a process-wide in-memory store.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            object_factory: Arc::new(DefaultObjectFactory),
        }
    }

    pub fn with_object_factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        self.object_factory = factory;
        self
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn create_session(
        &self,
        binding: Binding,
        parameters: SessionParameters,
    ) -> Result<Session> {
        SessionBuilder::new(parameters)
            .with_binding(binding)
            .with_store(self.store.clone())
            .with_object_factory(self.object_factory.clone())
            .build()
    }

    /// Every repository behind the binding's endpoint. Also fills the
    /// repository-info cache.
    pub fn get_repositories(
        &self,
        binding: Binding,
        parameters: &SessionParameters,
    ) -> Result<Vec<RepositoryInfo>> {
        parameters.validate()?;
        CmisBinding::new(binding, self.store.clone(), parameters)
            .repository_service()
            .get_repository_infos()
    }
}

impl Default for SessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

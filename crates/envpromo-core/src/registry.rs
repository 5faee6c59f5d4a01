//! Handler registry
//!
//! Provides [`HandlerRegistry`], the table from [`ArtifactType`] to the
//! [`ArtifactHandler`] that replays it. Types without an entry are logged
//! as missed by the dispatcher.

use crate::backend::ConfigBackend;
use crate::confirm::{AutoConfirm, PruneConfirm};
use crate::handlers::{
    AgentHandler, ArtifactHandler, AuthenticationHandler, EmailTemplateHandler, IdmHandler, InertHandler,
    JourneyHandler, ManagedApplicationHandler, MappingHandler, OAuth2ClientHandler, PolicyHandler,
    ResourceTypeHandler, ScriptHandler, SecretHandler, ServiceHandler, ThemeHandler, VariableHandler,
};
use envpromo_artifact::ArtifactType;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registry of replay handlers keyed by artifact type
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<ArtifactType, Arc<dyn ArtifactHandler>>,
}

impl HandlerRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with one handler per known type, pruning without prompting
    #[must_use]
    pub fn with_defaults(backend: Arc<dyn ConfigBackend>) -> Self {
        Self::with_backend(backend, Arc::new(AutoConfirm))
    }

    /// Registry with one handler per known type
    #[must_use]
    pub fn with_backend(backend: Arc<dyn ConfigBackend>, confirm: Arc<dyn PruneConfirm>) -> Self {
        let mut registry = Self::new();
        let mapping: Arc<dyn ArtifactHandler> = Arc::new(MappingHandler::new(backend.clone()));

        registry
            .register(ArtifactType::Application, Arc::new(OAuth2ClientHandler::new(backend.clone())))
            .register(ArtifactType::Authentication, Arc::new(AuthenticationHandler::new(backend.clone())))
            .register(ArtifactType::Journey, Arc::new(JourneyHandler::new(backend.clone(), confirm)))
            .register(
                ArtifactType::ManagedApplication,
                Arc::new(ManagedApplicationHandler::new(backend.clone())),
            )
            .register(ArtifactType::ResourceType, Arc::new(ResourceTypeHandler::new(backend.clone())))
            .register(ArtifactType::Script, Arc::new(ScriptHandler::new(backend.clone())))
            .register(ArtifactType::Service, Arc::new(ServiceHandler::new(backend.clone())))
            .register(ArtifactType::Theme, Arc::new(ThemeHandler))
            .register(ArtifactType::EmailTemplate, Arc::new(EmailTemplateHandler::new(backend.clone())))
            .register(ArtifactType::Idm, Arc::new(IdmHandler::new(backend.clone())))
            .register(ArtifactType::Secret, Arc::new(SecretHandler))
            .register(ArtifactType::Sync, mapping.clone())
            .register(ArtifactType::Mapping, mapping)
            .register(ArtifactType::Variable, Arc::new(VariableHandler::new(backend.clone())))
            .register(ArtifactType::Agent, Arc::new(AgentHandler::new(backend.clone())))
            .register(ArtifactType::Policy, Arc::new(PolicyHandler::new(backend)));

        for artifact_type in [ArtifactType::Idp, ArtifactType::Saml, ArtifactType::Cot, ArtifactType::PolicySet] {
            if let Some(handler) = InertHandler::for_type(&artifact_type) {
                registry.register(artifact_type, Arc::new(handler));
            }
        }
        registry
    }

    /// Register or replace the handler for a type
    pub fn register(&mut self, artifact_type: ArtifactType, handler: Arc<dyn ArtifactHandler>) -> &mut Self {
        self.handlers.insert(artifact_type, handler);
        self
    }

    /// Remove the handler for a type
    pub fn remove(&mut self, artifact_type: &ArtifactType) -> Option<Arc<dyn ArtifactHandler>> {
        self.handlers.remove(artifact_type)
    }

    /// Handler for a type
    #[inline]
    #[must_use]
    pub fn get(&self, artifact_type: &ArtifactType) -> Option<&Arc<dyn ArtifactHandler>> {
        self.handlers.get(artifact_type)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, artifact_type: &ArtifactType) -> bool {
        self.handlers.contains_key(artifact_type)
    }

    /// Registered types, sorted
    #[must_use]
    pub fn types(&self) -> Vec<&ArtifactType> {
        let mut types: Vec<_> = self.handlers.keys().collect();
        types.sort();
        types
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry").field("types", &self.types()).finish()
    }
}

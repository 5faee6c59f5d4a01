//! Types with no replay operation of their own

use super::{ArtifactHandler, DispatchContext, DispatchOutcome};
use crate::error::DispatchError;
use envpromo_artifact::{ArtifactPath, ArtifactType};

/// Reports a fixed outcome without touching the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InertHandler {
    outcome: DispatchOutcome,
}

impl InertHandler {
    /// Handler for `artifact_type`, if it is one with no operation
    #[must_use]
    pub fn for_type(artifact_type: &ArtifactType) -> Option<Self> {
        let outcome = match artifact_type {
            ArtifactType::Idp => DispatchOutcome::delegated("promoted with service config"),
            ArtifactType::Saml | ArtifactType::Cot | ArtifactType::PolicySet => {
                DispatchOutcome::unsupported("not promotable")
            }
            _ => return None,
        };
        Some(Self { outcome })
    }
}

#[async_trait::async_trait]
impl ArtifactHandler for InertHandler {
    async fn apply(&self, _path: &ArtifactPath, _ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        Ok(self.outcome.clone())
    }

    async fn remove(&self, _path: &ArtifactPath, _ctx: &DispatchContext) -> Result<DispatchOutcome, DispatchError> {
        Ok(self.outcome.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_inert_types_get_a_handler() {
        assert!(InertHandler::for_type(&ArtifactType::Idp).is_some());
        assert!(InertHandler::for_type(&ArtifactType::Saml).is_some());
        assert!(InertHandler::for_type(&ArtifactType::Policy).is_none());
    }

    #[tokio::test]
    async fn idp_is_delegated() {
        let handler = InertHandler::for_type(&ArtifactType::Idp).unwrap();
        let outcome = handler
            .apply(&ArtifactPath::new("realm/alpha/idp/google.json"), &DispatchContext::default())
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Delegated(_)));
    }
}

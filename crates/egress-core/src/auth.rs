use std::sync::Arc;

use egress_errors::prelude::ProxyError;
use egress_storage::prelude::{OrgDirectory, Organization};
use egress_types::prelude::{OrgId, OrgKey};

/// Last-ditch fallback so the demo surface works with zero configuration.
pub const DEMO_ORG_KEY: &str = "DEMO_ORG_KEY";

/// Where an org key may arrive from, in precedence order.
#[derive(Clone, Debug, Default)]
pub struct OrgKeySources {
    pub header: Option<String>,
    pub principal: Option<String>,
    pub cookie: Option<String>,
}

/// Demo bypass: a single fixed org key that short-circuits the directory
/// with a synthetic organization. Off unless explicitly enabled in config.
#[derive(Clone, Debug)]
pub struct BypassConfig {
    pub enabled: bool,
    pub org_key: String,
    pub org_id: String,
    pub org_name: String,
}

impl Default for BypassConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            org_key: DEMO_ORG_KEY.to_string(),
            org_id: "org-demo".to_string(),
            org_name: "Demo Org".to_string(),
        }
    }
}

pub struct OrgAuthenticator {
    directory: Arc<dyn OrgDirectory>,
    default_org_key: Option<String>,
    bypass: BypassConfig,
}

impl OrgAuthenticator {
    pub fn new(
        directory: Arc<dyn OrgDirectory>,
        default_org_key: Option<String>,
        bypass: BypassConfig,
    ) -> Self {
        Self {
            directory,
            default_org_key,
            bypass,
        }
    }

    /// Demo-surface resolution: header, then principal attribute, then
    /// session cookie, then the process default, then the demo fallback.
    pub fn resolve(&self, sources: &OrgKeySources) -> OrgKey {
        let key = sources
            .header
            .as_deref()
            .or(sources.principal.as_deref())
            .or(sources.cookie.as_deref())
            .or(self.default_org_key.as_deref())
            .unwrap_or(DEMO_ORG_KEY);
        OrgKey(key.to_string())
    }

    /// Management-surface resolution: the explicit header is required.
    pub fn resolve_strict(&self, sources: &OrgKeySources) -> Result<OrgKey, ProxyError> {
        sources
            .header
            .as_deref()
            .map(|key| OrgKey(key.to_string()))
            .ok_or_else(ProxyError::missing_org_key)
    }

    pub async fn validate(&self, key: &OrgKey) -> Result<Organization, ProxyError> {
        if self.bypass.enabled && key.as_str() == self.bypass.org_key {
            return Ok(Organization {
                id: OrgId(self.bypass.org_id.clone()),
                org_key: key.clone(),
                name: self.bypass.org_name.clone(),
            });
        }
        match self.directory.org_by_key(key).await {
            Ok(Some(org)) => Ok(org),
            Ok(None) => Err(ProxyError::invalid_org_key(&format!(
                "org key not registered: {}",
                key.as_str()
            ))),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn authenticate(
        &self,
        sources: &OrgKeySources,
    ) -> Result<(OrgKey, Organization), ProxyError> {
        let key = self.resolve(sources);
        let org = self.validate(&key).await?;
        Ok((key, org))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use egress_storage::prelude::{MemoryDirectory, StorageError};

    struct BrokenDirectory;

    #[async_trait]
    impl OrgDirectory for BrokenDirectory {
        async fn org_by_key(&self, _key: &OrgKey) -> Result<Option<Organization>, StorageError> {
            Err(StorageError::unavailable("directory offline"))
        }
    }

    fn directory() -> Arc<MemoryDirectory> {
        Arc::new(MemoryDirectory::seed([Organization {
            id: OrgId("org-1".into()),
            org_key: OrgKey("ORG_A".into()),
            name: "Org A".into(),
        }]))
    }

    fn sources(
        header: Option<&str>,
        principal: Option<&str>,
        cookie: Option<&str>,
    ) -> OrgKeySources {
        OrgKeySources {
            header: header.map(str::to_string),
            principal: principal.map(str::to_string),
            cookie: cookie.map(str::to_string),
        }
    }

    #[test]
    fn resolve_follows_precedence() {
        let auth = OrgAuthenticator::new(
            directory(),
            Some("DEFAULT_KEY".into()),
            BypassConfig::default(),
        );

        let key = auth.resolve(&sources(Some("H"), Some("P"), Some("C")));
        assert_eq!(key.as_str(), "H");

        let key = auth.resolve(&sources(None, Some("P"), Some("C")));
        assert_eq!(key.as_str(), "P");

        let key = auth.resolve(&sources(None, None, Some("C")));
        assert_eq!(key.as_str(), "C");

        let key = auth.resolve(&sources(None, None, None));
        assert_eq!(key.as_str(), "DEFAULT_KEY");
    }

    #[test]
    fn resolve_falls_back_to_demo_key_without_default() {
        let auth = OrgAuthenticator::new(directory(), None, BypassConfig::default());
        let key = auth.resolve(&OrgKeySources::default());
        assert_eq!(key.as_str(), DEMO_ORG_KEY);
    }

    #[test]
    fn strict_resolution_requires_header() {
        let auth = OrgAuthenticator::new(
            directory(),
            Some("DEFAULT_KEY".into()),
            BypassConfig::default(),
        );

        let err = auth
            .resolve_strict(&sources(None, Some("P"), Some("C")))
            .expect_err("header required");
        assert_eq!(err.obj().wire, "missing_org_key");

        let key = auth.resolve_strict(&sources(Some("H"), None, None)).unwrap();
        assert_eq!(key.as_str(), "H");
    }

    #[tokio::test]
    async fn validate_accepts_known_and_rejects_unknown() {
        let auth = OrgAuthenticator::new(directory(), None, BypassConfig::default());

        let org = auth.validate(&OrgKey("ORG_A".into())).await.unwrap();
        assert_eq!(org.name, "Org A");

        let err = auth
            .validate(&OrgKey("NOPE".into()))
            .await
            .expect_err("unknown key");
        assert_eq!(err.obj().wire, "invalid_org_key");
        assert_eq!(err.obj().http_status, 403);
    }

    #[tokio::test]
    async fn directory_outage_maps_to_db_unavailable() {
        let auth = OrgAuthenticator::new(Arc::new(BrokenDirectory), None, BypassConfig::default());
        let err = auth
            .validate(&OrgKey("ORG_A".into()))
            .await
            .expect_err("outage");
        assert_eq!(err.obj().wire, "db_unavailable");
        assert_eq!(err.obj().http_status, 500);
    }

    #[tokio::test]
    async fn bypass_survives_directory_outage() {
        let bypass = BypassConfig {
            enabled: true,
            ..BypassConfig::default()
        };
        let auth = OrgAuthenticator::new(Arc::new(BrokenDirectory), None, bypass);

        let org = auth
            .validate(&OrgKey(DEMO_ORG_KEY.into()))
            .await
            .expect("bypass org");
        assert_eq!(org.id.0, "org-demo");

        // Other keys still hit the directory.
        assert!(auth.validate(&OrgKey("ORG_A".into())).await.is_err());
    }
}

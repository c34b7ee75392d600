use std::collections::HashMap;

pub const DEFAULT_PURPOSE: &str = "notes.summarization";

/// Static policy-key to purpose lookup. Unknown or absent keys fall back to
/// the default purpose; resolution never fails.
#[derive(Clone, Debug)]
pub struct PurposeResolver {
    table: HashMap<String, String>,
    default_purpose: String,
}

impl PurposeResolver {
    pub fn new(table: HashMap<String, String>, default_purpose: impl Into<String>) -> Self {
        Self {
            table,
            default_purpose: default_purpose.into(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut table = HashMap::new();
        table.insert("health_pii_phi".to_string(), "health.intake".to_string());
        table.insert(
            "fin_pci_pii".to_string(),
            "fintech.fraud_explainer".to_string(),
        );
        Self::new(table, DEFAULT_PURPOSE)
    }

    pub fn resolve(&self, policy_key: Option<&str>) -> &str {
        policy_key
            .and_then(|key| self.table.get(key))
            .map(String::as_str)
            .unwrap_or(&self.default_purpose)
    }
}

impl Default for PurposeResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_map_to_purposes() {
        let resolver = PurposeResolver::with_defaults();
        assert_eq!(resolver.resolve(Some("health_pii_phi")), "health.intake");
        assert_eq!(
            resolver.resolve(Some("fin_pci_pii")),
            "fintech.fraud_explainer"
        );
    }

    #[test]
    fn unknown_and_absent_keys_use_default() {
        let resolver = PurposeResolver::with_defaults();
        assert_eq!(resolver.resolve(Some("mystery")), DEFAULT_PURPOSE);
        assert_eq!(resolver.resolve(None), DEFAULT_PURPOSE);
    }

    #[test]
    fn custom_table_overrides_default() {
        let mut table = HashMap::new();
        table.insert("legal".to_string(), "legal.review".to_string());
        let resolver = PurposeResolver::new(table, "fallback.purpose");
        assert_eq!(resolver.resolve(Some("legal")), "legal.review");
        assert_eq!(resolver.resolve(Some("other")), "fallback.purpose");
    }
}

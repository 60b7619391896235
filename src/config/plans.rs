use serde::{Deserialize, Serialize};

use crate::config::helpers::required_env;
use crate::error::{ConfigError, PlanError};

/// Provisioning template: the image and launch arguments for one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Catalog key.
    #[serde(rename = "plan")]
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Launch command, empty to use the image default.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Plan {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            args: Vec::new(),
        }
    }
}

/// Ordered collection of plans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    /// Parse the catalog from the `IMAGE_PLANS` JSON list.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let plans = serde_json::from_str(raw).map_err(|e| ConfigError::InvalidValue {
            key: "IMAGE_PLANS".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { plans })
    }

    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let raw = required_env(
            "IMAGE_PLANS",
            r#"Set IMAGE_PLANS to a JSON list, e.g. [{"plan":"memcached","image":"memcached:1"}]"#,
        )?;
        Self::from_json(&raw)
    }

    /// Look up a plan by name. The first match wins.
    pub fn get(&self, name: &str) -> Result<&Plan, PlanError> {
        self.plans
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| PlanError::NotFound(name.to_string()))
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLANS: &str = r#"[{"image":"memcached:1","plan":"memcached_1"},{"image":"memcached:1.3","plan":"memcached_1_3","args":["memcached","-m","64"]}]"#;

    #[test]
    fn test_catalog_from_json() {
        let catalog = PlanCatalog::from_json(PLANS).unwrap();
        assert_eq!(catalog.plans().len(), 2);
        assert_eq!(catalog.plans()[0].name, "memcached_1");
        assert_eq!(catalog.plans()[0].image, "memcached:1");
        assert!(catalog.plans()[0].args.is_empty());
        assert_eq!(catalog.plans()[1].name, "memcached_1_3");
        assert_eq!(catalog.plans()[1].image, "memcached:1.3");
        assert_eq!(catalog.plans()[1].args, vec!["memcached", "-m", "64"]);
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = PlanCatalog::from_json(PLANS).unwrap();
        assert_eq!(catalog.get("memcached_1_3").unwrap().image, "memcached:1.3");
        assert_eq!(
            catalog.get("redis"),
            Err(PlanError::NotFound("redis".to_string()))
        );
    }

    #[test]
    fn test_catalog_invalid_json() {
        let err = PlanCatalog::from_json(r#"{"plan":"x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "IMAGE_PLANS"));
    }

    #[test]
    fn test_plan_serializes_with_catalog_keys() {
        let json = serde_json::to_value(Plan::new("supermemcached", "memcached")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"plan": "supermemcached", "image": "memcached"})
        );
    }
}

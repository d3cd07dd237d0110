//! Plan entitlement: which exports are allowed and which carry a watermark.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::TemplateRegistry;

/// Shown instead of exporting a premium template on the free plan.
pub const PREMIUM_REQUIRED_MESSAGE: &str = "يجب الاشتراك لاستخدام القوالب المميزة للتصدير";

/// Stamped on free-plan exports. Builtin PDF fonts only cover WinAnsi, so
/// the mark is Latin.
pub const DEFAULT_WATERMARK_TEXT: &str =
    "WASFAK-CV - Free plan - upgrade on the website to remove this mark";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "premium" => Ok(Plan::Premium),
            other => Err(format!("unknown plan '{other}' (expected free or premium)")),
        }
    }
}

/// Whether exporting `template_id` is refused on `plan`.
pub fn is_export_blocked(registry: &TemplateRegistry, template_id: Option<&str>, plan: Plan) -> bool {
    plan == Plan::Free && registry.is_premium(template_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkPolicy {
    Stamp,
    Omit,
}

impl WatermarkPolicy {
    pub fn for_plan(plan: Plan) -> Self {
        match plan {
            Plan::Free => WatermarkPolicy::Stamp,
            Plan::Premium => WatermarkPolicy::Omit,
        }
    }

    pub fn stamps(self) -> bool {
        self == WatermarkPolicy::Stamp
    }
}

#[derive(Debug, Error)]
pub enum PlanLookupError {
    #[error("plan lookup for {owner} failed: {reason}")]
    Unavailable { owner: String, reason: String },
}

/// Answers "has this owner paid?". Backed by whatever payment store the host
/// application uses.
pub trait PlanSource: Send + Sync {
    fn fetch_plan(&self, owner_reference: &str) -> Result<Plan, PlanLookupError>;
}

/// A plan known up front.
#[derive(Debug, Clone, Copy)]
pub struct FixedPlan(pub Plan);

impl PlanSource for FixedPlan {
    fn fetch_plan(&self, _owner_reference: &str) -> Result<Plan, PlanLookupError> {
        Ok(self.0)
    }
}

/// Look up the owner's plan. A failed lookup is logged and treated as free.
pub fn resolve_plan(source: &dyn PlanSource, owner_reference: &str) -> Plan {
    if owner_reference.is_empty() {
        return Plan::Free;
    }
    match source.fetch_plan(owner_reference) {
        Ok(plan) => plan,
        Err(e) => {
            log::warn!("{e}; continuing on the free plan");
            Plan::Free
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl PlanSource for Broken {
        fn fetch_plan(&self, owner: &str) -> Result<Plan, PlanLookupError> {
            Err(PlanLookupError::Unavailable {
                owner: owner.to_string(),
                reason: "offline".into(),
            })
        }
    }

    #[test]
    fn premium_template_blocked_only_on_free() {
        let reg = TemplateRegistry::standard();
        assert!(is_export_blocked(&reg, Some("executive-premium"), Plan::Free));
        assert!(!is_export_blocked(&reg, Some("executive-premium"), Plan::Premium));
        assert!(!is_export_blocked(&reg, Some("modern-arabic"), Plan::Free));
        // Unknown ids resolve to the free default.
        assert!(!is_export_blocked(&reg, Some("nope"), Plan::Free));
    }

    #[test]
    fn watermark_follows_plan() {
        assert!(WatermarkPolicy::for_plan(Plan::Free).stamps());
        assert!(!WatermarkPolicy::for_plan(Plan::Premium).stamps());
    }

    #[test]
    fn plan_parses_case_insensitively() {
        assert_eq!("Premium".parse::<Plan>().unwrap(), Plan::Premium);
        assert!("gold".parse::<Plan>().is_err());
        assert_eq!(serde_json::to_string(&Plan::Free).unwrap(), "\"free\"");
    }

    #[test]
    fn failed_lookup_means_free() {
        assert_eq!(resolve_plan(&Broken, "u1"), Plan::Free);
        assert_eq!(resolve_plan(&FixedPlan(Plan::Premium), "u1"), Plan::Premium);
        assert_eq!(resolve_plan(&FixedPlan(Plan::Premium), ""), Plan::Free);
    }
}

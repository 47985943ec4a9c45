// 🔒 Premium feature gating

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumFeature {
    CreateBudgets,
    SavingsDeadlines,
    DeleteEntries,
    AdvancedCharts,
    ExportData,
}

impl PremiumFeature {
    pub const ALL: [PremiumFeature; 5] = [
        PremiumFeature::CreateBudgets,
        PremiumFeature::SavingsDeadlines,
        PremiumFeature::DeleteEntries,
        PremiumFeature::AdvancedCharts,
        PremiumFeature::ExportData,
    ];

    /// Benefit line on the upgrade page
    pub fn benefit(&self) -> &'static str {
        match self {
            PremiumFeature::CreateBudgets => "Create unlimited budgets",
            PremiumFeature::SavingsDeadlines => "Set savings goals with deadlines",
            PremiumFeature::DeleteEntries => "Delete entries and manage data",
            PremiumFeature::AdvancedCharts => "Advanced charts and analytics",
            PremiumFeature::ExportData => "Export data as CSV",
        }
    }
}

/// What happens when a user reaches for a premium feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGate {
    Allowed,
    /// Signed-in user without premium: send them to the subscription page
    UpgradeRequired,
    /// Demo visitor: nothing to upgrade until they sign up
    SignUpRequired,
}

impl FeatureGate {
    pub fn evaluate(has_access: bool, demo: bool) -> Self {
        if has_access {
            FeatureGate::Allowed
        } else if demo {
            FeatureGate::SignUpRequired
        } else {
            FeatureGate::UpgradeRequired
        }
    }

    pub fn is_allowed(&self) -> bool {
        *self == FeatureGate::Allowed
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            FeatureGate::Allowed => None,
            FeatureGate::UpgradeRequired => Some("Upgrade to premium to use this feature"),
            FeatureGate::SignUpRequired => Some("Sign up to access this feature"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_decisions() {
        assert_eq!(FeatureGate::evaluate(true, false), FeatureGate::Allowed);
        assert_eq!(FeatureGate::evaluate(false, false), FeatureGate::UpgradeRequired);
        assert_eq!(FeatureGate::evaluate(false, true), FeatureGate::SignUpRequired);
    }

    #[test]
    fn test_hints() {
        assert_eq!(FeatureGate::Allowed.hint(), None);
        assert_eq!(
            FeatureGate::SignUpRequired.hint(),
            Some("Sign up to access this feature")
        );
        assert!(FeatureGate::UpgradeRequired.hint().unwrap().contains("premium"));
    }

    #[test]
    fn test_every_feature_has_a_benefit() {
        for feature in PremiumFeature::ALL {
            assert!(!feature.benefit().is_empty());
        }
    }
}

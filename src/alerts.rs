//! Safety alerts, recomputed on every tick

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::BiometricState;
use crate::profile::UserProfile;

const MAX_HR_ALERT_FRACTION: f64 = 0.9;
const HYPERTENSION_HR_LIMIT: u16 = 160;
const DEHYDRATION_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// Condition an alert reports on; at most one alert per kind per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    MaxHeartRate,
    Hypertension,
    Dehydration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Check the current state against the safety limits
pub fn check_alerts(state: &BiometricState, profile: &UserProfile) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let limit = f64::from(profile.max_heart_rate_or_default()) * MAX_HR_ALERT_FRACTION;
    if f64::from(state.heart_rate) > limit {
        alerts.push(Alert {
            kind: AlertKind::MaxHeartRate,
            severity: AlertSeverity::Critical,
            message: "Heart rate approaching your maximum safe limit".to_string(),
        });
    }

    if profile.has_condition("Hypertension") && state.heart_rate > HYPERTENSION_HR_LIMIT {
        alerts.push(Alert {
            kind: AlertKind::Hypertension,
            severity: AlertSeverity::Warning,
            message: "Heart rate elevated - consider reducing intensity (hypertension management)"
                .to_string(),
        });
    }

    if state.hydration_level < DEHYDRATION_THRESHOLD {
        alerts.push(Alert {
            kind: AlertKind::Dehydration,
            severity: AlertSeverity::Warning,
            message: "Dehydration risk - performance declining".to_string(),
        });
    }

    alerts
}

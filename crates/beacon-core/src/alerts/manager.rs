//! Alert lifecycle management and storage.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{Alert, AlertFilter, AlertOutcome, AlertPolicy, AlertState, AUTO_RESOLVE_ACTOR};
use crate::{classifier::Tier, errors::EngineError, scoring::ScoreResult, types::Domain};

#[derive(Debug, Default)]
struct AlertStore {
    /// Alerts in insertion order.
    alerts: Vec<Alert>,
    /// Live alert id per (subject, domain). At most one entry per key.
    live: HashMap<(String, Domain), String>,
    /// Newest `evaluated_at` applied per (subject, domain) that has stored alerts.
    last_seen: HashMap<(String, Domain), DateTime<Utc>>,
}

impl AlertStore {
    fn position(&self, alert_id: &str) -> Option<usize> {
        self.alerts.iter().position(|a| a.id == alert_id)
    }

    /// Most recently inserted alert for a subject and domain.
    fn latest(&self, key: &(String, Domain)) -> Option<&Alert> {
        self.alerts.iter().rev().find(|a| a.subject_id == key.0 && a.domain == key.1)
    }

    /// Drops the oldest resolved alerts until the store fits `max_alerts`.
    /// Live alerts are never evicted, so the store may stay above the bound.
    fn evict(&mut self, max_alerts: usize) -> usize {
        let mut excess = self.alerts.len().saturating_sub(max_alerts);
        if excess == 0 {
            return 0;
        }

        let before = self.alerts.len();
        self.alerts.retain(|alert| {
            if excess > 0 && alert.state == AlertState::Resolved {
                excess -= 1;
                false
            } else {
                true
            }
        });
        let evicted = before - self.alerts.len();
        if evicted > 0 {
            let Self { alerts, last_seen, .. } = self;
            let kept: HashSet<(&str, Domain)> =
                alerts.iter().map(|a| (a.subject_id.as_str(), a.domain)).collect();
            last_seen.retain(|(subject, domain), _| kept.contains(&(subject.as_str(), *domain)));
        }
        evicted
    }
}

/// Turns classified score results into alerts and manages their lifecycle.
///
/// One live (OPEN or ACKNOWLEDGED) alert exists per subject and domain. Repeat
/// results for that pair update the live alert in place until it is resolved;
/// a later above-floor result then opens a new alert. All mutations go through
/// a single write lock, so results for one pair apply in the order they were
/// produced. Results older than the last applied one are ignored, including
/// after the pair's alert was resolved.
#[derive(Debug, Clone)]
pub struct AlertManager {
    store: Arc<RwLock<AlertStore>>,
    policy: Arc<AlertPolicy>,
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertPolicy::default())
    }
}

impl AlertManager {
    #[must_use]
    pub fn new(policy: AlertPolicy) -> Self {
        Self { store: Arc::new(RwLock::new(AlertStore::default())), policy: Arc::new(policy) }
    }

    #[must_use]
    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    /// Applies a classified result to the alert store.
    ///
    /// - no live alert, tier at or above the floor: opens an alert
    /// - live alert: updates score, tier and reasons in place; with
    ///   `auto_resolve_below_floor` a below-floor result also resolves it
    /// - result older than the last one applied for the subject and domain:
    ///   ignored, whether or not the alert is still live
    pub fn observe(&self, result: &ScoreResult, tier: &Tier) -> AlertOutcome {
        let Some(floor) = self.policy.floor(result.domain) else {
            return AlertOutcome::NotRaised;
        };
        let above_floor = tier.rank >= floor;
        let key = (result.subject_id.clone(), result.domain);

        let mut store = self.store.write();

        if let Some(seen) = store.last_seen.get(&key).copied() {
            if result.evaluated_at < seen {
                debug!(
                    subject_id = %result.subject_id,
                    domain = %result.domain,
                    evaluated_at = %result.evaluated_at,
                    last_evaluated_at = %seen,
                    "ignoring stale result"
                );
                return store.latest(&key).cloned().map_or(AlertOutcome::NotRaised, AlertOutcome::Stale);
            }
            store.last_seen.insert(key.clone(), result.evaluated_at);
        }

        let live_position = store.live.get(&key).and_then(|id| store.position(id));
        if let Some(position) = live_position {
            let alert = &mut store.alerts[position];
            alert.apply(result, tier);

            if !above_floor && self.policy.auto_resolve_below_floor {
                alert.resolve(AUTO_RESOLVE_ACTOR, result.evaluated_at);
                let resolved = alert.clone();
                store.live.remove(&key);
                info!(
                    alert_id = %resolved.id,
                    subject_id = %resolved.subject_id,
                    domain = %resolved.domain,
                    tier = %resolved.tier,
                    "alert auto-resolved below floor"
                );
                return AlertOutcome::AutoResolved(resolved);
            }

            debug!(alert_id = %alert.id, tier = %alert.tier, score = alert.score, "alert updated");
            return AlertOutcome::Updated(alert.clone());
        }

        if !above_floor {
            return AlertOutcome::NotRaised;
        }

        let alert = Alert::open(Uuid::new_v4().to_string(), result, tier);
        info!(
            alert_id = %alert.id,
            subject_id = %alert.subject_id,
            domain = %alert.domain,
            tier = %alert.tier,
            score = alert.score,
            "alert opened"
        );
        store.last_seen.insert(key.clone(), result.evaluated_at);
        store.live.insert(key, alert.id.clone());
        store.alerts.push(alert.clone());

        let evicted = store.evict(self.policy.max_alerts);
        if evicted > 0 {
            debug!(evicted, "evicted resolved alerts");
        }

        AlertOutcome::Opened(alert)
    }

    /// Acknowledges a live alert.
    ///
    /// Acknowledging an already acknowledged alert succeeds and keeps the
    /// first acknowledger.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidTransition`] if the alert does not exist or is resolved.
    pub fn acknowledge(&self, alert_id: &str, actor: &str) -> Result<Alert, EngineError> {
        let mut store = self.store.write();
        let alert = live_alert_mut(&mut store, alert_id, "acknowledge")?;

        alert.acknowledge(actor, Utc::now());
        info!(alert_id = %alert.id, actor, "alert acknowledged");
        Ok(alert.clone())
    }

    /// Resolves a live alert.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidTransition`] if the alert does not exist or is resolved.
    pub fn resolve(&self, alert_id: &str, actor: &str) -> Result<Alert, EngineError> {
        let mut store = self.store.write();
        let alert = live_alert_mut(&mut store, alert_id, "resolve")?;

        alert.resolve(actor, Utc::now());
        let resolved = alert.clone();
        store.live.remove(&(resolved.subject_id.clone(), resolved.domain));
        info!(alert_id = %resolved.id, actor, "alert resolved");
        Ok(resolved)
    }

    #[must_use]
    pub fn get_alert(&self, alert_id: &str) -> Option<Alert> {
        self.store.read().alerts.iter().find(|a| a.id == alert_id).cloned()
    }

    /// Alerts matching `filter`, newest `opened_at` first. Ties list the most
    /// recently inserted alert first.
    #[must_use]
    pub fn list_alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        let mut alerts: Vec<Alert> =
            self.store.read().alerts.iter().rev().filter(|a| filter.matches(a)).cloned().collect();
        alerts.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
        alerts
    }

    /// The live alert for a subject and domain, if any.
    #[must_use]
    pub fn live_alert(&self, subject_id: &str, domain: Domain) -> Option<Alert> {
        let store = self.store.read();
        let id = store.live.get(&(subject_id.to_string(), domain))?;
        store.alerts.iter().find(|a| &a.id == id).cloned()
    }

    /// Number of OPEN and ACKNOWLEDGED alerts.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.store.read().live.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.read().alerts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.read().alerts.is_empty()
    }
}

fn live_alert_mut<'a>(
    store: &'a mut AlertStore,
    alert_id: &str,
    action: &'static str,
) -> Result<&'a mut Alert, EngineError> {
    match store.alerts.iter_mut().find(|a| a.id == alert_id) {
        Some(alert) if alert.state.is_live() => Ok(alert),
        Some(alert) => Err(EngineError::InvalidTransition {
            alert_id: alert_id.to_string(),
            from: Some(alert.state),
            action,
            current: Some(Box::new(alert.clone())),
        }),
        None => Err(EngineError::InvalidTransition {
            alert_id: alert_id.to_string(),
            from: None,
            action,
            current: None,
        }),
    }
}

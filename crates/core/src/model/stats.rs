use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CheckIn, CheckInStatus, ClientId, ClientRosterEntry};

/// A client counts as active if they checked in within this many days.
pub const ACTIVE_WINDOW_DAYS: i64 = 30;

/// A `needs_attention` check-in older than this requires intervention.
pub const INTERVENTION_GRACE_DAYS: i64 = 7;

/// The best single-client weight delta in the current window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestProgress {
    pub client_id: ClientId,
    pub delta: f64,
}

/// Weight-trend analytics over the aggregation window.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightLossStats {
    pub total: f64,
    pub average: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best: Option<BestProgress>,
}

/// Derived dashboard statistics for one coach.
///
/// A pure function of the latest `(roster, check-ins)` snapshot pair; it has
/// no lifecycle of its own and is recomputed wholesale on every input change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub active_clients: usize,
    pub need_attention: usize,
    pub require_intervention: usize,
    pub weight_loss: WeightLossStats,
}

impl ProgressStats {
    /// Recompute statistics from full snapshots of both inputs.
    ///
    /// Deterministic and free of I/O, so feeding the same pair twice yields
    /// identical results regardless of which stream emitted last.
    #[must_use]
    pub fn compute(roster: &[ClientRosterEntry], check_ins: &[CheckIn], now: DateTime<Utc>) -> Self {
        let active_cutoff = now - Duration::days(ACTIVE_WINDOW_DAYS);
        let stale_cutoff = now - Duration::days(INTERVENTION_GRACE_DAYS);

        let active_clients = roster
            .iter()
            .filter(|c| c.last_check_in_at.is_some_and(|at| at > active_cutoff))
            .count();

        let need_attention = check_ins
            .iter()
            .filter(|ci| ci.status() == CheckInStatus::NeedsAttention)
            .count();

        let require_intervention = check_ins
            .iter()
            .filter(|ci| ci.status() == CheckInStatus::NeedsAttention && ci.date() < stale_cutoff)
            .count();

        let mut total = 0.0;
        let mut best: Option<BestProgress> = None;
        for client in roster {
            let Some(delta) = weight_delta(&client.client_id, check_ins) else {
                continue;
            };
            total += delta;
            // Strict comparison keeps the first (roster-order) client on ties.
            if delta > 0.0 && best.as_ref().is_none_or(|b| delta > b.delta) {
                best = Some(BestProgress {
                    client_id: client.client_id.clone(),
                    delta,
                });
            }
        }
        let average = if roster.is_empty() {
            0.0
        } else {
            total / roster.len() as f64
        };

        Self {
            active_clients,
            need_attention,
            require_intervention,
            weight_loss: WeightLossStats { total, average, best },
        }
    }
}

/// Weight lost by one client across the window: oldest minus newest reading.
///
/// Requires at least two check-ins carrying a weight; otherwise the client
/// contributes nothing to the trend.
fn weight_delta(client_id: &ClientId, check_ins: &[CheckIn]) -> Option<f64> {
    let mut oldest: Option<&CheckIn> = None;
    let mut newest: Option<&CheckIn> = None;
    let mut count = 0_usize;

    for ci in check_ins {
        if ci.client_id() != client_id || ci.weight().is_none() {
            continue;
        }
        count += 1;
        if oldest.is_none_or(|o| ci.date() < o.date()) {
            oldest = Some(ci);
        }
        if newest.is_none_or(|n| ci.date() > n.date()) {
            newest = Some(ci);
        }
    }

    if count < 2 {
        return None;
    }
    match (oldest?.weight(), newest?.weight()) {
        (Some(first), Some(last)) => Some(first - last),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckInId, CoachId, Measurements};
    use crate::time::fixed_now;

    fn roster_entry(id: &str, last_check_in: Option<DateTime<Utc>>) -> ClientRosterEntry {
        ClientRosterEntry {
            client_id: ClientId::new(id),
            name: format!("Client {id}"),
            coach_id: CoachId::new("coach-1"),
            last_check_in_at: last_check_in,
            streak_days: 0,
        }
    }

    fn check_in(
        id: &str,
        client: &str,
        days_ago: i64,
        status: CheckInStatus,
        weight: Option<f64>,
    ) -> CheckIn {
        let measurements = weight.map_or_else(Measurements::default, Measurements::with_weight);
        CheckIn::from_persisted(
            CheckInId::new(id),
            ClientId::new(client),
            CoachId::new("coach-1"),
            fixed_now() - Duration::days(days_ago),
            status,
            100.0,
            Vec::new(),
            measurements,
        )
        .unwrap()
    }

    #[test]
    fn counts_active_clients_within_thirty_days() {
        let now = fixed_now();
        let roster = vec![
            roster_entry("a", Some(now - Duration::days(5))),
            roster_entry("b", Some(now - Duration::days(45))),
            roster_entry("c", None),
        ];
        let stats = ProgressStats::compute(&roster, &[], now);
        assert_eq!(stats.active_clients, 1);
    }

    #[test]
    fn intervention_requires_staleness_past_grace() {
        let roster = vec![roster_entry("a", None)];
        let window = vec![
            check_in("c1", "a", 10, CheckInStatus::NeedsAttention, None),
            check_in("c2", "a", 3, CheckInStatus::NeedsAttention, None),
            check_in("c3", "a", 20, CheckInStatus::Completed, None),
        ];
        let stats = ProgressStats::compute(&roster, &window, fixed_now());
        assert_eq!(stats.need_attention, 2);
        assert_eq!(stats.require_intervention, 1);
    }

    #[test]
    fn weight_trend_matches_two_client_scenario() {
        let roster = vec![roster_entry("a", None), roster_entry("b", None)];
        let window = vec![
            check_in("c1", "a", 1, CheckInStatus::Completed, Some(68.0)),
            check_in("c2", "a", 14, CheckInStatus::Completed, Some(70.0)),
            check_in("c3", "b", 2, CheckInStatus::Completed, Some(80.0)),
        ];
        let stats = ProgressStats::compute(&roster, &window, fixed_now());
        assert!((stats.weight_loss.total - 2.0).abs() < f64::EPSILON);
        assert!((stats.weight_loss.average - 1.0).abs() < f64::EPSILON);
        let best = stats.weight_loss.best.unwrap();
        assert_eq!(best.client_id, ClientId::new("a"));
        assert!((best.delta - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gaining_clients_never_win_best() {
        let roster = vec![roster_entry("a", None)];
        let window = vec![
            check_in("c1", "a", 1, CheckInStatus::Completed, Some(72.0)),
            check_in("c2", "a", 14, CheckInStatus::Completed, Some(70.0)),
        ];
        let stats = ProgressStats::compute(&roster, &window, fixed_now());
        assert!((stats.weight_loss.total + 2.0).abs() < f64::EPSILON);
        assert!(stats.weight_loss.best.is_none());
    }

    #[test]
    fn recompute_is_idempotent() {
        let roster = vec![roster_entry("a", Some(fixed_now()))];
        let window = vec![
            check_in("c1", "a", 1, CheckInStatus::NeedsAttention, Some(68.0)),
            check_in("c2", "a", 14, CheckInStatus::Completed, Some(70.0)),
        ];
        let first = ProgressStats::compute(&roster, &window, fixed_now());
        let second = ProgressStats::compute(&roster, &window, fixed_now());
        assert_eq!(first, second);
    }

    #[test]
    fn empty_roster_yields_zeroed_average() {
        let stats = ProgressStats::compute(&[], &[], fixed_now());
        assert_eq!(stats, ProgressStats::default());
    }
}

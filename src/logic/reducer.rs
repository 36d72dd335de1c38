//! Per-User Risk Reducer
//!
//! Bounds alert volume to one high-risk candidate per user: across a batch
//! of sequence records, only the record with the highest anomaly metric per
//! user survives. Records without a user identifier are dropped, not
//! errors. First-seen user order is preserved because report numbering
//! depends on it.

use std::collections::HashMap;

use super::engine::normalize::markov_anomaly_metric;
use super::engine::rules::RuleThresholds;
use super::engine::types::SequenceRecord;

/// The retained top-risk record for one user
#[derive(Debug, Clone)]
pub struct RiskCandidate {
    pub user_id: String,
    pub risk_score: f64,
    pub record: SequenceRecord,
}

/// Reduce a batch to one candidate per user, in first-seen user order.
///
/// Strict `>` on update, so the first-encountered record wins ties.
pub fn top_risk_per_user(
    records: Vec<SequenceRecord>,
    thresholds: &RuleThresholds,
) -> Vec<RiskCandidate> {
    let mut candidates: Vec<RiskCandidate> = Vec::new();
    let mut by_user: HashMap<String, usize> = HashMap::new();

    for record in records {
        let user_id = match record.user_id() {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => {
                log::debug!("dropping sequence record without user_id");
                continue;
            }
        };

        let risk_score = markov_anomaly_metric(record.score(), thresholds);
        match by_user.get(&user_id) {
            Some(&i) => {
                if risk_score > candidates[i].risk_score {
                    candidates[i].risk_score = risk_score;
                    candidates[i].record = record;
                }
            }
            None => {
                by_user.insert(user_id.clone(), candidates.len());
                candidates.push(RiskCandidate {
                    user_id,
                    risk_score,
                    record,
                });
            }
        }
    }

    candidates
}

// ============================================================================
// TESTS
// ============================================================================

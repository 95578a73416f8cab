//! Recommendation ranking.
//!
//! Five weighted factors score each recommendation on a 0-100 scale;
//! the weighted composite orders the final list and re-grades priority
//! so a recommendation's label always matches its position.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::RankingWeights;
use crate::risk::RiskAssessment;
use crate::rules::{Priority, Recommendation, SavingsEstimate};

/// Per-factor scores, each 0-100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankFactors {
    pub savings: f64,
    pub urgency: f64,
    pub success: f64,
    pub ease: f64,
    pub risk_reduction: f64,
}

/// A recommendation with its rank, composite score, and factor breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRecommendation {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub final_rank: usize,
    pub composite_score: f64,
    pub factors: RankFactors,
    pub rationale: String,
}

/// Rank recommendations by weighted composite, highest first. Ties break
/// on priority, then original catalog order (the sort is stable).
pub fn rank(
    recommendations: Vec<Recommendation>,
    risk: &RiskAssessment,
    weights: &RankingWeights,
    today: NaiveDate,
) -> Vec<RankedRecommendation> {
    let mut ranked: Vec<RankedRecommendation> = recommendations
        .into_iter()
        .map(|rec| {
            let factors = score_factors(&rec, risk, today);
            let composite = composite(&factors, weights);
            let rationale = rationale(&rec, &factors);
            RankedRecommendation {
                recommendation: rec,
                final_rank: 0,
                composite_score: composite,
                factors,
                rationale,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.composite_score
            .partial_cmp(&a.composite_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.recommendation
                    .priority
                    .rank()
                    .cmp(&a.recommendation.priority.rank())
            })
    });

    for (i, r) in ranked.iter_mut().enumerate() {
        r.final_rank = i + 1;
        r.recommendation.priority = regrade(r.composite_score);
    }

    tracing::debug!(count = ranked.len(), "ranking complete");
    ranked
}

fn score_factors(rec: &Recommendation, risk: &RiskAssessment, today: NaiveDate) -> RankFactors {
    RankFactors {
        savings: savings_score(&rec.savings),
        urgency: urgency_score(rec, today),
        success: success_score(rec),
        ease: ease_score(rec.effort_minutes),
        risk_reduction: risk_reduction_score(rec, risk),
    }
}

/// Absolute dollar tiers, discounted when the estimate itself is shaky.
/// Tiers are not scaled to the profile's balances.
fn savings_score(savings: &SavingsEstimate) -> f64 {
    let tier = if savings.expected > 5_000.0 {
        100.0
    } else if savings.expected > 2_000.0 {
        80.0
    } else if savings.expected > 500.0 {
        60.0
    } else if savings.expected > 100.0 {
        40.0
    } else {
        20.0
    };
    tier * (0.7 + 0.3 * savings.confidence)
}

fn urgency_score(rec: &Recommendation, today: NaiveDate) -> f64 {
    let base = match rec.deadline {
        Some(deadline) => {
            let days = (deadline - today).num_days();
            if days < 0 {
                100.0
            } else if days == 0 {
                95.0
            } else if days <= 3 {
                85.0
            } else if days <= 7 {
                70.0
            } else if days <= 14 {
                55.0
            } else if days <= 30 {
                40.0
            } else {
                25.0
            }
        }
        None => 50.0,
    };
    (base + rec.priority.urgency_adjustment()).clamp(0.0, 100.0)
}

fn success_score(rec: &Recommendation) -> f64 {
    rec.success_probability * 100.0
}

fn ease_score(effort_minutes: u32) -> f64 {
    if effort_minutes <= 15 {
        100.0
    } else if effort_minutes <= 30 {
        80.0
    } else if effort_minutes <= 60 {
        60.0
    } else if effort_minutes <= 120 {
        40.0
    } else {
        20.0
    }
}

fn risk_reduction_score(rec: &Recommendation, risk: &RiskAssessment) -> f64 {
    // Risk-lowering actions matter more the riskier the situation is.
    let base = rec.risk_reduction * 2.0 + rec.category.risk_reduction_boost();
    (base * (1.0 + risk.overall_score / 200.0)).min(100.0)
}

fn composite(factors: &RankFactors, weights: &RankingWeights) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }
    (factors.savings * weights.savings
        + factors.urgency * weights.urgency
        + factors.success * weights.success
        + factors.ease * weights.ease
        + factors.risk_reduction * weights.risk_reduction)
        / total
}

fn regrade(composite: f64) -> Priority {
    if composite >= 85.0 {
        Priority::Critical
    } else if composite >= 70.0 {
        Priority::High
    } else if composite >= 50.0 {
        Priority::Medium
    } else if composite >= 30.0 {
        Priority::Low
    } else {
        Priority::Informational
    }
}

fn rationale(rec: &Recommendation, factors: &RankFactors) -> String {
    let mut parts = Vec::new();
    if factors.savings >= 80.0 {
        parts.push(format!(
            "large expected savings (${:.0})",
            rec.savings.expected
        ));
    } else if factors.savings >= 60.0 {
        parts.push(format!(
            "meaningful expected savings (${:.0})",
            rec.savings.expected
        ));
    }
    if factors.urgency >= 80.0 {
        parts.push("time-sensitive".to_string());
    }
    if factors.success >= 80.0 {
        parts.push("high likelihood of success".to_string());
    }
    if factors.ease >= 80.0 {
        parts.push("quick to complete".to_string());
    }
    if factors.risk_reduction >= 60.0 {
        parts.push("significantly lowers financial risk".to_string());
    }
    if parts.is_empty() {
        "Worth pursuing once higher-ranked actions are underway".to_string()
    } else {
        let mut s = parts.join("; ");
        if let Some(first) = s.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        s
    }
}

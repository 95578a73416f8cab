//! Plan assembly: buckets ranked recommendations into time horizons and
//! builds the final navigation plan response.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzers::AnalyzerFindings;
use crate::models::FinancialProfile;
use crate::ranking::RankedRecommendation;
use crate::risk::{RiskAssessment, RiskCategory};
use crate::rules::{Priority, SavingsEstimate, SkippedRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Immediate,
    ThisWeek,
    ThisMonth,
    Ongoing,
}

impl Horizon {
    pub fn as_str(&self) -> &'static str {
        match self {
            Horizon::Immediate => "immediate",
            Horizon::ThisWeek => "this_week",
            Horizon::ThisMonth => "this_month",
            Horizon::Ongoing => "ongoing",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A plan entry: a pointer into the ranked recommendation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub rule_id: String,
    pub title: String,
    pub priority: Priority,
    pub deadline: Option<NaiveDate>,
    pub final_rank: usize,
}

/// Recommendations grouped by when to act, rank order preserved within
/// each bucket.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionPlan {
    pub immediate: Vec<PlanStep>,
    pub this_week: Vec<PlanStep>,
    pub this_month: Vec<PlanStep>,
    pub ongoing: Vec<PlanStep>,
}

impl ActionPlan {
    pub fn len(&self) -> usize {
        self.immediate.len() + self.this_week.len() + self.this_month.len() + self.ongoing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The complete engine output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationPlanResponse {
    pub generated: NaiveDate,
    pub valid_until: NaiveDate,
    pub risk: RiskAssessment,
    pub findings: AnalyzerFindings,
    pub recommendations: Vec<RankedRecommendation>,
    pub plan: ActionPlan,
    pub skipped_rules: Vec<SkippedRule>,
    pub total_amount_owed: f64,
    pub total_savings: SavingsEstimate,
    /// Risk points the plan could remove if completed, diminishing with
    /// each additional action and never exceeding the current score.
    pub total_risk_reduction: f64,
    /// How many recommendations carry critical priority after regrading.
    pub critical_action_count: usize,
    pub executive_summary: String,
    pub key_takeaways: Vec<String>,
    pub confidence: f64,
    pub data_completeness: f64,
}

/// Which horizon a recommendation lands in. Deadline wins over priority.
pub fn horizon_for(rec: &RankedRecommendation, today: NaiveDate) -> Horizon {
    if let Some(deadline) = rec.recommendation.deadline {
        let days = (deadline - today).num_days();
        if days <= 2 {
            return Horizon::Immediate;
        } else if days <= 7 {
            return Horizon::ThisWeek;
        } else if days <= 30 {
            return Horizon::ThisMonth;
        }
    }
    match rec.recommendation.priority {
        Priority::Critical => Horizon::Immediate,
        Priority::High => Horizon::ThisWeek,
        Priority::Medium => Horizon::ThisMonth,
        Priority::Low | Priority::Informational => Horizon::Ongoing,
    }
}

/// Assemble the final response from the pipeline stages.
pub fn assemble(
    profile: &FinancialProfile,
    today: NaiveDate,
    findings: AnalyzerFindings,
    risk: RiskAssessment,
    recommendations: Vec<RankedRecommendation>,
    skipped_rules: Vec<SkippedRule>,
) -> NavigationPlanResponse {
    let mut plan = ActionPlan::default();
    for rec in &recommendations {
        let step = PlanStep {
            rule_id: rec.recommendation.rule_id.clone(),
            title: rec.recommendation.title.clone(),
            priority: rec.recommendation.priority,
            deadline: rec.recommendation.deadline,
            final_rank: rec.final_rank,
        };
        match horizon_for(rec, today) {
            Horizon::Immediate => plan.immediate.push(step),
            Horizon::ThisWeek => plan.this_week.push(step),
            Horizon::ThisMonth => plan.this_month.push(step),
            Horizon::Ongoing => plan.ongoing.push(step),
        }
    }

    let total_amount_owed = profile.total_amount_owed();
    let total_savings = total_savings(&recommendations);
    let total_risk_reduction = total_risk_reduction(&recommendations, &risk);
    let critical_action_count = recommendations
        .iter()
        .filter(|r| r.recommendation.priority == Priority::Critical)
        .count();
    let executive_summary =
        executive_summary(profile, &risk, &recommendations, &total_savings);
    let key_takeaways = key_takeaways(&findings, &risk, &recommendations);
    let data_completeness = data_completeness(profile);
    let confidence = ((findings.mean_confidence() + risk.confidence) / 2.0).clamp(0.0, 1.0);

    NavigationPlanResponse {
        generated: today,
        valid_until: today + Duration::days(30),
        risk,
        findings,
        recommendations,
        plan,
        skipped_rules,
        total_amount_owed,
        total_savings,
        total_risk_reduction,
        critical_action_count,
        executive_summary,
        key_takeaways,
        confidence,
        data_completeness,
    }
}

fn total_savings(recommendations: &[RankedRecommendation]) -> SavingsEstimate {
    if recommendations.is_empty() {
        return SavingsEstimate {
            minimum: 0.0,
            expected: 0.0,
            maximum: 0.0,
            confidence: 0.5,
        };
    }
    let minimum: f64 = recommendations
        .iter()
        .map(|r| r.recommendation.savings.minimum)
        .sum();
    let expected: f64 = recommendations
        .iter()
        .map(|r| r.recommendation.savings.expected)
        .sum();
    let maximum: f64 = recommendations
        .iter()
        .map(|r| r.recommendation.savings.maximum)
        .sum();
    // Expected-weighted confidence; plain mean when nothing has a dollar
    // estimate (payment plans alone, for example).
    let confidence = if expected > 0.0 {
        recommendations
            .iter()
            .map(|r| r.recommendation.savings.confidence * r.recommendation.savings.expected)
            .sum::<f64>()
            / expected
    } else {
        recommendations
            .iter()
            .map(|r| r.recommendation.savings.confidence)
            .sum::<f64>()
            / recommendations.len() as f64
    };
    SavingsEstimate {
        minimum,
        expected,
        maximum,
        confidence,
    }
}

fn total_risk_reduction(recommendations: &[RankedRecommendation], risk: &RiskAssessment) -> f64 {
    let mut discount = 1.0;
    let mut total = 0.0;
    for rec in recommendations {
        total += rec.recommendation.risk_reduction * rec.recommendation.success_probability * discount;
        discount *= 0.9;
    }
    total.min(risk.overall_score)
}

fn executive_summary(
    profile: &FinancialProfile,
    risk: &RiskAssessment,
    recommendations: &[RankedRecommendation],
    total_savings: &SavingsEstimate,
) -> String {
    let mut summary = format!(
        "Analysis of {} medical bill(s) totaling ${:.2}. Identified {} recommended action(s) with expected savings of ${:.2}.",
        profile.bills.len(),
        profile.total_amount_owed(),
        recommendations.len(),
        total_savings.expected,
    );

    let critical = recommendations
        .iter()
        .filter(|r| r.recommendation.priority == Priority::Critical)
        .count();
    if critical > 0 {
        summary.push_str(&format!(
            " {} action(s) are critical and should be started immediately.",
            critical
        ));
    }

    match risk.category {
        RiskCategory::Critical | RiskCategory::Severe => summary.push_str(
            " Overall financial risk is serious; assistance programs should be the first priority.",
        ),
        RiskCategory::High | RiskCategory::Moderate => summary
            .push_str(" Overall financial risk is elevated but manageable with prompt action."),
        RiskCategory::Low | RiskCategory::Minimal => {
            summary.push_str(" Overall financial risk is low.")
        }
    }

    summary
}

fn key_takeaways(
    findings: &AnalyzerFindings,
    risk: &RiskAssessment,
    recommendations: &[RankedRecommendation],
) -> Vec<String> {
    let mut takeaways = Vec::new();

    if let Some(top) = recommendations.first() {
        takeaways.push(format!(
            "Start with: {} (expected savings ${:.0})",
            top.recommendation.title, top.recommendation.savings.expected
        ));
    }
    if findings.income.likely_charity_care_eligible && findings.bills.total_patient_responsibility > 0.0
    {
        takeaways.push(
            "Your income level likely qualifies you for hospital financial assistance".to_string(),
        );
    }
    if findings.income.likely_medicaid_eligible {
        takeaways.push("You may be eligible for Medicaid; apply through your state".to_string());
    }
    if !findings.bills.issues.is_empty() {
        takeaways.push(format!(
            "{} billing issue(s) were found; do not pay disputed amounts until resolved",
            findings.bills.issues.len()
        ));
    }
    for alert in &risk.alerts {
        takeaways.push(alert.clone());
    }

    takeaways.truncate(5);
    takeaways
}

fn data_completeness(profile: &FinancialProfile) -> f64 {
    let mut score: f64 = 0.6;
    let all_coded = !profile.bills.is_empty()
        && profile.bills.iter().all(|b| {
            !b.line_items.is_empty() && b.line_items.iter().all(|l| l.procedure_code.is_some())
        });
    if all_coded {
        score += 0.1;
    }
    if profile.insurance.is_some() {
        score += 0.15;
    }
    if !profile.income_sources.is_empty() {
        score += 0.1;
    }
    if profile.state.is_some() {
        score += 0.05;
    }
    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::RankFactors;
    use crate::rules::{ActionCategory, Recommendation};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ranked(
        id: &str,
        rank: usize,
        priority: Priority,
        deadline: Option<&str>,
        expected: f64,
    ) -> RankedRecommendation {
        RankedRecommendation {
            recommendation: Recommendation {
                rule_id: id.into(),
                title: format!("Action {}", id),
                description: String::new(),
                category: ActionCategory::Negotiation,
                priority,
                savings: SavingsEstimate {
                    minimum: expected * 0.5,
                    expected,
                    maximum: expected * 1.5,
                    confidence: 0.7,
                },
                effort_minutes: 30,
                success_probability: 0.7,
                risk_reduction: 10.0,
                required_documents: vec![],
                action_steps: vec![],
                deadline: deadline.map(date),
                warnings: vec![],
            },
            final_rank: rank,
            composite_score: 60.0,
            factors: RankFactors {
                savings: 50.0,
                urgency: 50.0,
                success: 50.0,
                ease: 50.0,
                risk_reduction: 50.0,
            },
            rationale: String::new(),
        }
    }

    #[test]
    fn deadline_beats_priority_for_bucketing() {
        let today = date("2025-06-01");
        // Low priority but due tomorrow lands in immediate.
        let rec = ranked("a", 1, Priority::Low, Some("2025-06-02"), 100.0);
        assert_eq!(horizon_for(&rec, today), Horizon::Immediate);
        // Critical with a distant deadline still goes by the deadline.
        let rec = ranked("b", 2, Priority::Critical, Some("2025-06-20"), 100.0);
        assert_eq!(horizon_for(&rec, today), Horizon::ThisMonth);
    }

    #[test]
    fn priority_fallback_without_deadline() {
        let today = date("2025-06-01");
        let cases = [
            (Priority::Critical, Horizon::Immediate),
            (Priority::High, Horizon::ThisWeek),
            (Priority::Medium, Horizon::ThisMonth),
            (Priority::Low, Horizon::Ongoing),
            (Priority::Informational, Horizon::Ongoing),
        ];
        for (priority, expected) in cases {
            let rec = ranked("x", 1, priority, None, 100.0);
            assert_eq!(horizon_for(&rec, today), expected);
        }
    }

    #[test]
    fn every_recommendation_lands_in_exactly_one_bucket() {
        let today = date("2025-06-01");
        let profile = FinancialProfile {
            household_size: 1,
            annual_income: 50_000.0,
            monthly_expenses: 1_500.0,
            income_sources: vec![],
            debts: vec![],
            insurance: None,
            bills: vec![],
            state: None,
            employment_status: None,
            has_regular_prescriptions: false,
            has_chronic_condition: false,
        };
        let cfg = crate::config::EngineConfig::default();
        let findings = crate::analyzers::run_all(&profile, &cfg, today);
        let risk = crate::risk::assess(&profile, &findings, &cfg);
        let recs = vec![
            ranked("a", 1, Priority::Critical, None, 500.0),
            ranked("b", 2, Priority::High, Some("2025-06-25"), 200.0),
            ranked("c", 3, Priority::Informational, None, 0.0),
        ];
        let response = assemble(&profile, today, findings, risk, recs, vec![]);
        assert_eq!(response.plan.len(), response.recommendations.len());
        assert_eq!(response.valid_until, date("2025-07-01"));
        // One of the three carried critical priority.
        assert_eq!(response.critical_action_count, 1);
    }

    #[test]
    fn total_savings_sums_and_weights_confidence() {
        let recs = vec![
            ranked("a", 1, Priority::High, None, 1_000.0),
            ranked("b", 2, Priority::Medium, None, 500.0),
        ];
        let total = total_savings(&recs);
        assert!((total.expected - 1_500.0).abs() < 0.01);
        assert!((total.minimum - 750.0).abs() < 0.01);
        assert!((total.maximum - 2_250.0).abs() < 0.01);
        assert!((total.confidence - 0.7).abs() < 0.01);
    }

    #[test]
    fn empty_plan_has_neutral_savings_confidence() {
        let total = total_savings(&[]);
        assert!((total.confidence - 0.5).abs() < f64::EPSILON);
        assert!((total.expected - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn risk_reduction_is_capped_by_current_score() {
        let risk = RiskAssessment {
            overall_score: 10.0,
            category: RiskCategory::Minimal,
            dimensions: vec![],
            top_drivers: vec![],
            critical_factors: vec![],
            alerts: vec![],
            confidence: 0.8,
        };
        let recs: Vec<RankedRecommendation> = (0..10)
            .map(|i| ranked(&format!("r{}", i), i + 1, Priority::Medium, None, 100.0))
            .collect();
        assert!((total_risk_reduction(&recs, &risk) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn data_completeness_rewards_richer_profiles() {
        let mut p = FinancialProfile {
            household_size: 1,
            annual_income: 50_000.0,
            monthly_expenses: 1_500.0,
            income_sources: vec![],
            debts: vec![],
            insurance: None,
            bills: vec![],
            state: None,
            employment_status: None,
            has_regular_prescriptions: false,
            has_chronic_condition: false,
        };
        let bare = data_completeness(&p);
        p.state = Some("CA".into());
        assert!(data_completeness(&p) > bare);
    }
}

//! Risk synthesis: folds the four analyzer findings into one weighted
//! assessment with a category, top drivers, critical factors, and alerts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::analyzers::{AnalyzerFindings, CoverageWarningKind, OopProximity, WarningSeverity};
use crate::config::EngineConfig;
use crate::models::{DebtStatus, FinancialProfile};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0-100, weighted sum of the dimension scores, rounded to a whole
    /// number so equal inputs print identically.
    pub overall_score: f64,
    pub category: RiskCategory,
    pub dimensions: Vec<RiskDimensionScore>,
    /// Dimension names ordered by weighted contribution, largest first.
    pub top_drivers: Vec<String>,
    /// Dimensions whose weighted contribution crosses the configured
    /// critical threshold.
    pub critical_factors: Vec<String>,
    pub alerts: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskDimensionScore {
    pub dimension: RiskDimension,
    /// Raw 0-100 score.
    pub score: f64,
    pub weight: f64,
    pub weighted_score: f64,
    pub drivers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDimension {
    Income,
    Debt,
    Insurance,
    Billing,
}

impl RiskDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskDimension::Income => "income",
            RiskDimension::Debt => "debt",
            RiskDimension::Insurance => "insurance",
            RiskDimension::Billing => "billing",
        }
    }
}

impl fmt::Display for RiskDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Minimal,
    Low,
    Moderate,
    High,
    Severe,
    Critical,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Minimal => "minimal",
            RiskCategory::Low => "low",
            RiskCategory::Moderate => "moderate",
            RiskCategory::High => "high",
            RiskCategory::Severe => "severe",
            RiskCategory::Critical => "critical",
        }
    }

    /// The canonical six-tier ladder.
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            RiskCategory::Critical
        } else if score >= 60.0 {
            RiskCategory::Severe
        } else if score >= 45.0 {
            RiskCategory::High
        } else if score >= 30.0 {
            RiskCategory::Moderate
        } else if score >= 15.0 {
            RiskCategory::Low
        } else {
            RiskCategory::Minimal
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "minimal" => Ok(RiskCategory::Minimal),
            "low" => Ok(RiskCategory::Low),
            "moderate" => Ok(RiskCategory::Moderate),
            "high" => Ok(RiskCategory::High),
            "severe" => Ok(RiskCategory::Severe),
            "critical" => Ok(RiskCategory::Critical),
            _ => Err(format!("unknown risk category: {}", s)),
        }
    }
}

/// Synthesize the overall risk assessment.
pub fn assess(
    profile: &FinancialProfile,
    findings: &AnalyzerFindings,
    config: &EngineConfig,
) -> RiskAssessment {
    let weights = &config.risk_weights;
    let weight_total = weights.total();

    let mut dimensions = vec![
        score_income(findings, weights.income / weight_total),
        score_debt(findings, weights.debt / weight_total),
        score_insurance(findings, weights.insurance / weight_total),
        score_billing(findings, weights.billing / weight_total),
    ];
    for d in &mut dimensions {
        d.weighted_score = d.score * d.weight;
    }

    let overall_score = dimensions
        .iter()
        .map(|d| d.score * d.weight)
        .sum::<f64>()
        .clamp(0.0, 100.0)
        .round();

    let mut by_contribution: Vec<&RiskDimensionScore> = dimensions.iter().collect();
    by_contribution.sort_by(|a, b| {
        b.weighted_score
            .partial_cmp(&a.weighted_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let top_drivers: Vec<String> = by_contribution
        .iter()
        .filter(|d| d.weighted_score > 0.0)
        .map(|d| d.dimension.as_str().to_string())
        .collect();
    let critical_factors: Vec<String> = by_contribution
        .iter()
        .filter(|d| d.weighted_score >= config.critical_factor_threshold)
        .map(|d| {
            let driver = d
                .drivers
                .first()
                .cloned()
                .unwrap_or_else(|| "elevated score".to_string());
            format!("{} risk is elevated: {}", d.dimension, driver)
        })
        .collect();

    let alerts = build_alerts(profile, findings);

    // Confidence: mean analyzer confidence, docked for each missing input
    // section.
    let mut confidence = findings.mean_confidence();
    if profile.insurance.is_none() {
        confidence -= 0.05;
    }
    if profile.bills.is_empty() {
        confidence -= 0.05;
    }
    if profile.debts.is_empty() {
        confidence -= 0.05;
    }
    if profile.income_sources.is_empty() {
        confidence -= 0.05;
    }

    let assessment = RiskAssessment {
        overall_score,
        category: RiskCategory::from_score(overall_score),
        dimensions,
        top_drivers,
        critical_factors,
        alerts,
        confidence: confidence.clamp(0.0, 1.0),
    };

    tracing::debug!(
        score = assessment.overall_score,
        category = assessment.category.as_str(),
        "risk assessment complete"
    );

    assessment
}

fn score_income(findings: &AnalyzerFindings, weight: f64) -> RiskDimensionScore {
    let inc = &findings.income;
    let instability = (1.0 - inc.stability_score) * 100.0;
    let score = (inc.hardship_score * 0.7 + instability * 0.3).clamp(0.0, 100.0);

    let mut drivers = Vec::new();
    if inc.fpl_percentage < 200.0 {
        drivers.push(format!(
            "income at {:.0}% of the poverty level",
            inc.fpl_percentage
        ));
    }
    if inc.stability_score < 0.7 {
        drivers.push("unstable income".to_string());
    }
    if inc.hardship_score >= 50.0 {
        drivers.push(format!("hardship score {:.0}", inc.hardship_score));
    }

    RiskDimensionScore {
        dimension: RiskDimension::Income,
        score,
        weight,
        weighted_score: 0.0,
        drivers,
    }
}

fn score_debt(findings: &AnalyzerFindings, weight: f64) -> RiskDimensionScore {
    let debt = &findings.debt;
    let score =
        (debt.dti_tier.risk_points() * 0.6 + debt.collections_risk * 100.0 * 0.4).clamp(0.0, 100.0);

    let mut drivers = Vec::new();
    if debt.dti_ratio >= 0.36 {
        drivers.push(format!(
            "debt payments take {:.0}% of income",
            debt.dti_ratio * 100.0
        ));
    }
    if debt.accounts_in_collections > 0 {
        drivers.push(format!(
            "{} account(s) in collections",
            debt.accounts_in_collections
        ));
    } else if debt.collections_risk >= 0.35 {
        drivers.push("delinquent accounts heading toward collections".to_string());
    }
    if debt.medical_debt > 0.0 {
        drivers.push(format!("${:.0} in medical debt", debt.medical_debt));
    }

    RiskDimensionScore {
        dimension: RiskDimension::Debt,
        score,
        weight,
        weighted_score: 0.0,
        drivers,
    }
}

fn score_insurance(findings: &AnalyzerFindings, weight: f64) -> RiskDimensionScore {
    let ins = &findings.insurance;

    let (score, mut drivers) = if !ins.has_coverage {
        (85.0, vec!["no insurance coverage".to_string()])
    } else {
        let exposure = (1.0 - ins.out_of_pocket.percent_met) * 50.0
            + (1.0 - ins.deductible.percent_met) * 30.0;
        let warning_points = ins
            .warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Warning)
            .count() as f64
            * 10.0;
        let score = (exposure + warning_points.min(20.0)).clamp(0.0, 100.0);

        let mut drivers = Vec::new();
        if ins.deductible.remaining > 0.0 {
            drivers.push(format!(
                "${:.0} of deductible still unmet",
                ins.deductible.remaining
            ));
        }
        for w in ins
            .warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Warning)
        {
            drivers.push(w.message.clone());
        }
        (score, drivers)
    };

    if drivers.is_empty() {
        drivers.push("cost sharing largely satisfied".to_string());
    }

    RiskDimensionScore {
        dimension: RiskDimension::Insurance,
        score,
        weight,
        weighted_score: 0.0,
        drivers,
    }
}

fn score_billing(findings: &AnalyzerFindings, weight: f64) -> RiskDimensionScore {
    let bills = &findings.bills;
    let suspect = bills.error_savings + bills.dispute_savings;
    let exposure_ratio = if bills.total_patient_responsibility > 0.0 {
        (suspect / bills.total_patient_responsibility).min(1.0)
    } else {
        0.0
    };
    let score = (bills.issues.len() as f64 * 10.0
        + exposure_ratio * 60.0
        + bills.failed_bills.len() as f64 * 5.0)
        .clamp(0.0, 100.0);

    let mut drivers = Vec::new();
    if !bills.issues.is_empty() {
        drivers.push(format!(
            "{} billing issue(s) worth ${:.0}",
            bills.issues.len(),
            suspect
        ));
    }
    if !bills.failed_bills.is_empty() {
        drivers.push(format!(
            "{} bill(s) could not be analyzed",
            bills.failed_bills.len()
        ));
    }

    RiskDimensionScore {
        dimension: RiskDimension::Billing,
        score,
        weight,
        weighted_score: 0.0,
        drivers,
    }
}

fn build_alerts(profile: &FinancialProfile, findings: &AnalyzerFindings) -> Vec<String> {
    let mut alerts = Vec::new();

    if findings.insurance.oop_proximity == OopProximity::Met {
        alerts.push(
            "Out-of-pocket maximum reached; additional in-network care should be fully covered"
                .to_string(),
        );
    }
    if findings
        .insurance
        .warnings
        .iter()
        .any(|w| w.kind == CoverageWarningKind::DeductibleReset)
    {
        alerts.push("Plan year ends soon and deductible progress will reset".to_string());
    }

    let past_due = profile
        .debts
        .iter()
        .filter(|d| d.status != DebtStatus::Current)
        .count();
    if past_due > 0 {
        alerts.push(format!("{} debt account(s) are past due", past_due));
    }
    if findings.debt.accounts_in_collections > 0 {
        alerts.push("Accounts in collections require prompt attention".to_string());
    }

    alerts
}

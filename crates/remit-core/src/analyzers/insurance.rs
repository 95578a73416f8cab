//! Insurance analysis: deductible and out-of-pocket accumulator status,
//! plan-year timing, and coverage warnings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{BillStatus, FinancialProfile, NetworkStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceFinding {
    pub has_coverage: bool,
    pub deductible: CostShareStatus,
    pub out_of_pocket: CostShareStatus,
    pub oop_proximity: OopProximity,
    pub days_until_plan_year_end: Option<i64>,
    pub warnings: Vec<CoverageWarning>,
    /// Patient balance with no expected insurance contribution.
    pub uncovered_exposure: f64,
    pub confidence: f64,
    pub limitations: Vec<String>,
}

impl InsuranceFinding {
    /// Finding for a profile with no insurance at all. Degraded but
    /// usable: downstream rules key off `has_coverage`.
    pub fn uninsured(profile: &FinancialProfile) -> Self {
        Self {
            has_coverage: false,
            deductible: CostShareStatus::empty(),
            out_of_pocket: CostShareStatus::empty(),
            oop_proximity: OopProximity::Far,
            days_until_plan_year_end: None,
            warnings: vec![CoverageWarning {
                kind: CoverageWarningKind::NoCoverage,
                severity: WarningSeverity::Warning,
                message: "No insurance coverage on file; full charges fall to the patient"
                    .to_string(),
            }],
            uncovered_exposure: profile.total_amount_owed(),
            confidence: 0.4,
            limitations: vec![
                "No insurance information provided; coverage analysis skipped".to_string()
            ],
        }
    }

    pub fn degraded(reason: &str) -> Self {
        Self {
            has_coverage: false,
            deductible: CostShareStatus::empty(),
            out_of_pocket: CostShareStatus::empty(),
            oop_proximity: OopProximity::Far,
            days_until_plan_year_end: None,
            warnings: vec![],
            uncovered_exposure: 0.0,
            confidence: 0.1,
            limitations: vec![reason.to_string()],
        }
    }
}

/// Progress against a deductible or out-of-pocket limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostShareStatus {
    pub limit: f64,
    pub used: f64,
    pub remaining: f64,
    /// 0.0-1.0. A zero limit counts as fully met: there is nothing left
    /// for the patient to pay toward it.
    pub percent_met: f64,
}

impl CostShareStatus {
    pub fn new(limit: f64, used: f64) -> Self {
        let remaining = (limit - used).max(0.0);
        let percent_met = if limit > 0.0 {
            (used / limit).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            limit,
            used,
            remaining,
            percent_met,
        }
    }

    fn empty() -> Self {
        Self {
            limit: 0.0,
            used: 0.0,
            remaining: 0.0,
            percent_met: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OopProximity {
    Met,
    VeryClose,
    Close,
    Moderate,
    Far,
}

impl OopProximity {
    pub fn as_str(&self) -> &'static str {
        match self {
            OopProximity::Met => "met",
            OopProximity::VeryClose => "very_close",
            OopProximity::Close => "close",
            OopProximity::Moderate => "moderate",
            OopProximity::Far => "far",
        }
    }

    fn from_percent(pct: f64) -> Self {
        if pct >= 1.0 {
            OopProximity::Met
        } else if pct >= 0.85 {
            OopProximity::VeryClose
        } else if pct >= 0.70 {
            OopProximity::Close
        } else if pct >= 0.50 {
            OopProximity::Moderate
        } else {
            OopProximity::Far
        }
    }
}

impl fmt::Display for OopProximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Info,
    Attention,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageWarningKind {
    NoCoverage,
    ClaimNotSubmitted,
    OutOfNetwork,
    UnknownNetwork,
    PreventiveCostShare,
    HighDeductible,
    DeductibleReset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageWarning {
    pub kind: CoverageWarningKind,
    pub severity: WarningSeverity,
    pub message: String,
}

/// Analyze insurance position as of the given date.
pub fn analyze(
    profile: &FinancialProfile,
    config: &EngineConfig,
    today: NaiveDate,
) -> Result<InsuranceFinding> {
    let Some(ins) = &profile.insurance else {
        return Ok(InsuranceFinding::uninsured(profile));
    };

    let mut limitations = Vec::new();
    let mut confidence: f64 = 0.9;

    let deductible = CostShareStatus::new(ins.deductible, ins.deductible_used);
    let out_of_pocket = CostShareStatus::new(ins.oop_max, ins.oop_used);
    let oop_proximity = OopProximity::from_percent(out_of_pocket.percent_met);

    let days_until_plan_year_end = ins
        .plan_year_end
        .map(|end| (end - today).num_days());
    if ins.plan_year_end.is_none() {
        limitations.push("Plan year end unknown; reset timing not assessed".to_string());
        confidence -= 0.1;
    }

    let mut warnings = Vec::new();

    // Bills that never reached the insurer.
    let unsubmitted = profile
        .bills
        .iter()
        .filter(|b| {
            b.status == BillStatus::Pending
                && b.insurance_paid.unwrap_or(0.0) == 0.0
                && b.total_amount > 200.0
        })
        .count();
    if unsubmitted > 0 {
        warnings.push(CoverageWarning {
            kind: CoverageWarningKind::ClaimNotSubmitted,
            severity: WarningSeverity::Warning,
            message: format!(
                "{} bill(s) show no insurance payment and may never have been submitted",
                unsubmitted
            ),
        });
    }

    let oon = profile
        .bills
        .iter()
        .filter(|b| b.network_status == Some(NetworkStatus::OutOfNetwork))
        .count();
    if oon > 0 {
        warnings.push(CoverageWarning {
            kind: CoverageWarningKind::OutOfNetwork,
            severity: WarningSeverity::Warning,
            message: format!("{} bill(s) are out-of-network; higher cost sharing applies", oon),
        });
    }

    let unknown_network = profile
        .bills
        .iter()
        .filter(|b| b.network_status.is_none() || b.network_status == Some(NetworkStatus::Unknown))
        .count();
    if unknown_network > 0 && !profile.bills.is_empty() {
        warnings.push(CoverageWarning {
            kind: CoverageWarningKind::UnknownNetwork,
            severity: WarningSeverity::Attention,
            message: format!(
                "{} bill(s) have unverified network status; confirm with the insurer",
                unknown_network
            ),
        });
    }

    // Preventive services with patient cost share point to a coding or
    // adjudication problem.
    let preventive_charged = profile.bills.iter().any(|b| {
        b.line_items.iter().any(|li| {
            li.procedure_code
                .as_deref()
                .map(|c| config.preventive_codes.contains(c))
                .unwrap_or(false)
                && li.patient_responsibility.unwrap_or(0.0) > 0.0
        })
    });
    if preventive_charged {
        warnings.push(CoverageWarning {
            kind: CoverageWarningKind::PreventiveCostShare,
            severity: WarningSeverity::Warning,
            message: "Preventive services were billed with patient cost share".to_string(),
        });
    }

    if ins.deductible > 5_000.0 {
        warnings.push(CoverageWarning {
            kind: CoverageWarningKind::HighDeductible,
            severity: WarningSeverity::Attention,
            message: "High-deductible plan; significant out-of-pocket costs before coverage"
                .to_string(),
        });
    }

    if let Some(days) = days_until_plan_year_end {
        if (0..45).contains(&days) && deductible.percent_met > 0.5 {
            warnings.push(CoverageWarning {
                kind: CoverageWarningKind::DeductibleReset,
                severity: WarningSeverity::Attention,
                message: format!(
                    "Plan year ends in {} days; deductible progress will reset",
                    days
                ),
            });
        }
    }

    // Exposure the plan will not touch: OON balances plus everything the
    // patient owes before the deductible is met.
    let oon_balance: f64 = profile
        .bills
        .iter()
        .filter(|b| b.is_unpaid() && b.network_status == Some(NetworkStatus::OutOfNetwork))
        .map(|b| b.patient_responsibility)
        .sum();
    let uncovered_exposure =
        oon_balance + deductible.remaining.min(profile.total_amount_owed());

    let finding = InsuranceFinding {
        has_coverage: true,
        deductible,
        out_of_pocket,
        oop_proximity,
        days_until_plan_year_end,
        warnings,
        uncovered_exposure,
        confidence: confidence.clamp(0.0, 1.0),
        limitations,
    };

    tracing::debug!(
        oop_proximity = finding.oop_proximity.as_str(),
        warnings = finding.warnings.len(),
        "insurance analysis complete"
    );

    Ok(finding)
}

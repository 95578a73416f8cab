//! The four domain analyzers and their dispatcher.
//!
//! Analyzers are pure functions over the profile. Income runs first since
//! the debt and bill analyzers key off the poverty-level percentage. A
//! failing analyzer never aborts the run: the dispatcher substitutes a
//! degraded finding carrying the failure as a limitation.

pub mod bill;
pub mod debt;
pub mod income;
pub mod insurance;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::FinancialProfile;

pub use bill::{
    BillingIssue, BillingIssueKind, BillsFinding, NegotiationOpportunity, NegotiationStrategy,
    SkippedBill,
};
pub use debt::{AssistanceProgram, DebtFinding, DtiTier, QualificationAssessment};
pub use income::{IncomeFinding, IncomeTier};
pub use insurance::{
    CostShareStatus, CoverageWarning, CoverageWarningKind, InsuranceFinding, OopProximity,
    WarningSeverity,
};

/// Combined output of all four analyzers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerFindings {
    pub income: IncomeFinding,
    pub debt: DebtFinding,
    pub insurance: InsuranceFinding,
    pub bills: BillsFinding,
}

impl AnalyzerFindings {
    /// Mean analyzer confidence.
    pub fn mean_confidence(&self) -> f64 {
        (self.income.confidence
            + self.debt.confidence
            + self.insurance.confidence
            + self.bills.confidence)
            / 4.0
    }
}

/// Run every analyzer, substituting degraded findings on failure.
pub fn run_all(
    profile: &FinancialProfile,
    config: &EngineConfig,
    today: NaiveDate,
) -> AnalyzerFindings {
    let income = income::analyze(profile, config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "income analyzer failed");
        IncomeFinding::degraded(&format!("Income analysis failed: {}", e))
    });

    let debt = debt::analyze(profile, &income, config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "debt analyzer failed");
        DebtFinding::degraded(&format!("Debt analysis failed: {}", e))
    });

    let insurance = insurance::analyze(profile, config, today).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "insurance analyzer failed");
        InsuranceFinding::degraded(&format!("Insurance analysis failed: {}", e))
    });

    let bills = bill::analyze(profile, &income, config, today).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "bill analyzer failed");
        BillsFinding::degraded(&format!("Bill analysis failed: {}", e))
    });

    AnalyzerFindings {
        income,
        debt,
        insurance,
        bills,
    }
}

//! Debt analysis: debt composition, debt-to-income position, delinquency
//! risk, and relief-program qualification assessments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{DebtStatus, FinancialProfile};

use super::income::IncomeFinding;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtFinding {
    pub total_debt: f64,
    pub medical_debt: f64,
    pub consumer_debt: f64,
    pub secured_debt: f64,
    pub unsecured_debt: f64,
    pub monthly_debt_payments: f64,
    /// Monthly debt payments over monthly income.
    pub dti_ratio: f64,
    pub dti_tier: DtiTier,
    /// 0.0-1.0, the worst delinquency indicator across accounts and bills.
    pub collections_risk: f64,
    pub accounts_in_collections: usize,
    pub accounts_past_due: usize,
    pub qualifications: Vec<QualificationAssessment>,
    pub confidence: f64,
    pub limitations: Vec<String>,
}

impl DebtFinding {
    pub fn degraded(reason: &str) -> Self {
        Self {
            total_debt: 0.0,
            medical_debt: 0.0,
            consumer_debt: 0.0,
            secured_debt: 0.0,
            unsecured_debt: 0.0,
            monthly_debt_payments: 0.0,
            dti_ratio: 0.0,
            dti_tier: DtiTier::Excellent,
            collections_risk: 0.0,
            accounts_in_collections: 0,
            accounts_past_due: 0,
            qualifications: vec![],
            confidence: 0.1,
            limitations: vec![reason.to_string()],
        }
    }

    pub fn qualification(&self, program: AssistanceProgram) -> Option<&QualificationAssessment> {
        self.qualifications
            .iter()
            .find(|q| q.program == program && q.qualifies)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtiTier {
    Excellent,
    Good,
    Manageable,
    Elevated,
    High,
    Severe,
}

impl DtiTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DtiTier::Excellent => "excellent",
            DtiTier::Good => "good",
            DtiTier::Manageable => "manageable",
            DtiTier::Elevated => "elevated",
            DtiTier::High => "high",
            DtiTier::Severe => "severe",
        }
    }

    fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.20 {
            DtiTier::Excellent
        } else if ratio < 0.28 {
            DtiTier::Good
        } else if ratio < 0.36 {
            DtiTier::Manageable
        } else if ratio < 0.43 {
            DtiTier::Elevated
        } else if ratio < 0.50 {
            DtiTier::High
        } else {
            DtiTier::Severe
        }
    }

    /// Risk points contributed to the debt dimension score.
    pub fn risk_points(&self) -> f64 {
        match self {
            DtiTier::Excellent => 5.0,
            DtiTier::Good => 15.0,
            DtiTier::Manageable => 30.0,
            DtiTier::Elevated => 50.0,
            DtiTier::High => 70.0,
            DtiTier::Severe => 90.0,
        }
    }
}

impl fmt::Display for DtiTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DtiTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "excellent" => Ok(DtiTier::Excellent),
            "good" => Ok(DtiTier::Good),
            "manageable" => Ok(DtiTier::Manageable),
            "elevated" => Ok(DtiTier::Elevated),
            "high" => Ok(DtiTier::High),
            "severe" => Ok(DtiTier::Severe),
            _ => Err(format!("unknown dti tier: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistanceProgram {
    CharityCare,
    ZeroInterestPaymentPlan,
    MedicalDebtRelief,
}

impl AssistanceProgram {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistanceProgram::CharityCare => "charity_care",
            AssistanceProgram::ZeroInterestPaymentPlan => "zero_interest_payment_plan",
            AssistanceProgram::MedicalDebtRelief => "medical_debt_relief",
        }
    }
}

impl fmt::Display for AssistanceProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationAssessment {
    pub program: AssistanceProgram,
    pub qualifies: bool,
    /// Estimated approval likelihood, 0.0-1.0.
    pub likelihood: f64,
    pub reason: String,
}

/// Analyze debt load. Takes the income finding since qualification
/// thresholds key off the poverty-level percentage.
pub fn analyze(
    profile: &FinancialProfile,
    income: &IncomeFinding,
    _config: &EngineConfig,
) -> Result<DebtFinding> {
    let mut limitations = Vec::new();
    let mut confidence: f64 = 0.9;

    let medical_debt = profile.total_medical_debt();
    let account_total: f64 = profile.debts.iter().map(|d| d.balance).sum();
    let bill_total = profile.total_amount_owed();
    let total_debt = account_total + bill_total;

    let consumer_debt: f64 = profile
        .debts
        .iter()
        .filter(|d| !d.is_medical)
        .map(|d| d.balance)
        .sum();
    let secured_debt: f64 = profile
        .debts
        .iter()
        .filter(|d| d.is_secured)
        .map(|d| d.balance)
        .sum();
    let unsecured_debt = account_total - secured_debt + bill_total;

    let monthly_debt_payments: f64 = profile.debts.iter().map(|d| d.monthly_payment).sum();
    let monthly_income = income.monthly_income;
    let dti_ratio = if monthly_income > 0.0 {
        monthly_debt_payments / monthly_income
    } else if monthly_debt_payments > 0.0 {
        limitations.push("No income to support debt payments; DTI treated as severe".to_string());
        1.0
    } else {
        0.0
    };

    if profile.debts.is_empty() && profile.bills.is_empty() {
        limitations.push("No debt accounts or bills provided".to_string());
        confidence = 0.5;
    }
    if profile
        .debts
        .iter()
        .any(|d| d.monthly_payment == 0.0 && d.balance > 0.0)
    {
        limitations
            .push("Some accounts carry no stated payment; DTI may be understated".to_string());
        confidence -= 0.1;
    }

    // Worst single indicator wins; delinquencies do not stack.
    let account_risk = profile
        .debts
        .iter()
        .map(|d| d.status.risk_weight())
        .fold(0.0, f64::max);
    let bill_risk = if profile.bills.iter().any(|b| b.in_collections) {
        DebtStatus::Collections.risk_weight()
    } else {
        0.0
    };
    let collections_risk = account_risk.max(bill_risk);

    let accounts_in_collections = profile
        .debts
        .iter()
        .filter(|d| d.status == DebtStatus::Collections)
        .count()
        + profile.bills.iter().filter(|b| b.in_collections).count();
    let accounts_past_due = profile
        .debts
        .iter()
        .filter(|d| d.status != DebtStatus::Current && d.status != DebtStatus::Collections)
        .count();

    let qualifications = assess_qualifications(income.fpl_percentage, medical_debt, income);

    let finding = DebtFinding {
        total_debt,
        medical_debt,
        consumer_debt,
        secured_debt,
        unsecured_debt,
        monthly_debt_payments,
        dti_ratio,
        dti_tier: DtiTier::from_ratio(dti_ratio),
        collections_risk,
        accounts_in_collections,
        accounts_past_due,
        qualifications,
        confidence: confidence.clamp(0.0, 1.0),
        limitations,
    };

    tracing::debug!(
        total_debt = finding.total_debt,
        dti_tier = finding.dti_tier.as_str(),
        collections_risk = finding.collections_risk,
        "debt analysis complete"
    );

    Ok(finding)
}

fn assess_qualifications(
    fpl_percentage: f64,
    medical_debt: f64,
    income: &IncomeFinding,
) -> Vec<QualificationAssessment> {
    let mut out = Vec::new();

    let charity_qualifies = fpl_percentage < 400.0;
    let charity_likelihood = if fpl_percentage < 200.0 {
        0.9
    } else if fpl_percentage < 300.0 {
        0.7
    } else if fpl_percentage < 400.0 {
        0.5
    } else {
        0.0
    };
    out.push(QualificationAssessment {
        program: AssistanceProgram::CharityCare,
        qualifies: charity_qualifies,
        likelihood: charity_likelihood,
        reason: format!(
            "Household income is {:.0}% of the federal poverty level",
            fpl_percentage
        ),
    });

    let plan_qualifies = medical_debt > 500.0;
    out.push(QualificationAssessment {
        program: AssistanceProgram::ZeroInterestPaymentPlan,
        qualifies: plan_qualifies,
        likelihood: if plan_qualifies { 0.85 } else { 0.0 },
        reason: if plan_qualifies {
            format!(
                "${:.0} in medical debt; most providers offer interest-free plans",
                medical_debt
            )
        } else {
            "Medical debt below typical payment plan minimums".to_string()
        },
    });

    let relief_qualifies =
        income.annual_income > 0.0 && medical_debt > income.annual_income * 0.25;
    out.push(QualificationAssessment {
        program: AssistanceProgram::MedicalDebtRelief,
        qualifies: relief_qualifies,
        likelihood: if relief_qualifies { 0.6 } else { 0.0 },
        reason: if relief_qualifies {
            "Medical debt exceeds a quarter of annual income".to_string()
        } else {
            "Medical debt is small relative to income".to_string()
        },
    });

    out
}

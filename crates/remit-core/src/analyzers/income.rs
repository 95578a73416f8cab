//! Income analysis: poverty-level position, income stability, and the
//! financial hardship score that drives assistance eligibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::models::{DebtStatus, FinancialProfile, IncomeStability};

/// Output of the income analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeFinding {
    pub monthly_income: f64,
    pub annual_income: f64,
    /// Poverty threshold for this household size.
    pub fpl_threshold: f64,
    /// Household income as a percentage of the poverty threshold.
    pub fpl_percentage: f64,
    pub income_tier: IncomeTier,
    /// 0.0 (entirely unstable) to 1.0 (fully stable and verified).
    pub stability_score: f64,
    /// 0-100 composite hardship score.
    pub hardship_score: f64,
    /// The individual conditions that contributed to the hardship score.
    pub hardship_flags: Vec<String>,
    /// Sustainable monthly medical payment: disposable income times the
    /// configured affordability fraction.
    pub medical_payment_capacity: f64,
    pub likely_medicaid_eligible: bool,
    pub likely_subsidy_eligible: bool,
    pub likely_charity_care_eligible: bool,
    /// Estimated charity care discount fraction at typical hospitals.
    pub estimated_charity_discount: f64,
    pub confidence: f64,
    pub limitations: Vec<String>,
}

impl IncomeFinding {
    /// Fallback finding when income analysis cannot run at all.
    pub fn degraded(reason: &str) -> Self {
        Self {
            monthly_income: 0.0,
            annual_income: 0.0,
            fpl_threshold: 0.0,
            fpl_percentage: 0.0,
            income_tier: IncomeTier::VeryLow,
            stability_score: 0.5,
            hardship_score: 50.0,
            hardship_flags: vec![],
            medical_payment_capacity: 0.0,
            likely_medicaid_eligible: false,
            likely_subsidy_eligible: false,
            likely_charity_care_eligible: false,
            estimated_charity_discount: 0.0,
            confidence: 0.1,
            limitations: vec![reason.to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeTier {
    VeryLow,
    Low,
    Moderate,
    Middle,
    UpperMiddle,
    High,
}

impl IncomeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeTier::VeryLow => "very_low",
            IncomeTier::Low => "low",
            IncomeTier::Moderate => "moderate",
            IncomeTier::Middle => "middle",
            IncomeTier::UpperMiddle => "upper_middle",
            IncomeTier::High => "high",
        }
    }

    fn from_fpl_percentage(pct: f64) -> Self {
        if pct < 100.0 {
            IncomeTier::VeryLow
        } else if pct < 200.0 {
            IncomeTier::Low
        } else if pct < 400.0 {
            IncomeTier::Moderate
        } else if pct < 600.0 {
            IncomeTier::Middle
        } else if pct < 800.0 {
            IncomeTier::UpperMiddle
        } else {
            IncomeTier::High
        }
    }
}

impl fmt::Display for IncomeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IncomeTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "very_low" => Ok(IncomeTier::VeryLow),
            "low" => Ok(IncomeTier::Low),
            "moderate" => Ok(IncomeTier::Moderate),
            "middle" => Ok(IncomeTier::Middle),
            "upper_middle" => Ok(IncomeTier::UpperMiddle),
            "high" => Ok(IncomeTier::High),
            _ => Err(format!("unknown income tier: {}", s)),
        }
    }
}

/// Analyze household income against federal poverty guidelines.
pub fn analyze(profile: &FinancialProfile, config: &EngineConfig) -> Result<IncomeFinding> {
    let mut limitations = Vec::new();
    let mut confidence: f64 = 0.9;

    let annual = profile.effective_annual_income();
    if !profile.annual_income.is_finite() || !annual.is_finite() {
        return Err(Error::Analysis(
            "income figures are not finite numbers".to_string(),
        ));
    }
    let monthly = annual / 12.0;

    if annual <= 0.0 {
        limitations.push("No income information provided; treating income as zero".to_string());
        confidence = 0.3;
    } else if profile.annual_income <= 0.0 {
        limitations.push("Annual income derived from monthly income sources".to_string());
        confidence -= 0.1;
    }
    if profile.income_sources.is_empty() {
        limitations.push("No income sources listed; stability assumed average".to_string());
        confidence -= 0.1;
    }
    if config.fpl.built_in {
        limitations
            .push("Using built-in federal poverty guidelines; verify current year".to_string());
        confidence -= 0.05;
    }

    let threshold = config.fpl.threshold(profile.household_size);
    let fpl_percentage = if threshold > 0.0 {
        annual / threshold * 100.0
    } else {
        0.0
    };

    let stability_score = stability(profile);
    let (hardship_score, hardship_flags) = hardship(profile, fpl_percentage, annual);
    let disposable = (monthly - profile.monthly_expenses).max(0.0);
    let medical_payment_capacity = disposable * config.affordability_fraction;

    let finding = IncomeFinding {
        monthly_income: monthly,
        annual_income: annual,
        fpl_threshold: threshold,
        fpl_percentage,
        income_tier: IncomeTier::from_fpl_percentage(fpl_percentage),
        stability_score,
        hardship_score,
        hardship_flags,
        medical_payment_capacity,
        likely_medicaid_eligible: fpl_percentage < 138.0,
        likely_subsidy_eligible: fpl_percentage < 400.0,
        likely_charity_care_eligible: fpl_percentage < 400.0,
        estimated_charity_discount: charity_discount(fpl_percentage),
        confidence: confidence.clamp(0.0, 1.0),
        limitations,
    };

    tracing::debug!(
        fpl_percentage = format!("{:.1}", finding.fpl_percentage),
        hardship = finding.hardship_score,
        tier = finding.income_tier.as_str(),
        "income analysis complete"
    );

    Ok(finding)
}

/// Weighted income stability in [0, 1]. Unstable income drags the score
/// down twice as hard as very-stable income lifts it; unverified sources
/// apply a flat haircut.
fn stability(profile: &FinancialProfile) -> f64 {
    let total: f64 = profile
        .income_sources
        .iter()
        .map(|s| s.monthly_amount)
        .sum();
    if total <= 0.0 {
        return 0.5;
    }

    let unstable: f64 = profile
        .income_sources
        .iter()
        .filter(|s| s.stability == IncomeStability::Unstable)
        .map(|s| s.monthly_amount)
        .sum();
    let very_stable: f64 = profile
        .income_sources
        .iter()
        .filter(|s| s.stability == IncomeStability::VeryStable)
        .map(|s| s.monthly_amount)
        .sum();

    let mut score = 1.0 - 0.5 * (unstable / total) + 0.2 * (very_stable / total);
    if profile.income_sources.iter().any(|s| !s.verified) {
        score *= 0.9;
    }
    score.clamp(0.0, 1.0)
}

/// Additive hardship score, capped at 100, plus the conditions that
/// produced it. The poverty-level bonuses stack: a household under 100%
/// FPL earns both the <100 and <200 bumps.
fn hardship(
    profile: &FinancialProfile,
    fpl_percentage: f64,
    annual_income: f64,
) -> (f64, Vec<String>) {
    let mut score: f64 = 0.0;
    let mut flags = Vec::new();

    if fpl_percentage < 100.0 {
        score += 40.0;
        flags.push("below_poverty_line".to_string());
    }
    if fpl_percentage < 200.0 {
        score += 25.0;
        flags.push("low_income".to_string());
    }

    let medical_debt = profile.total_medical_debt();
    let heavy_medical_debt = if annual_income > 0.0 {
        medical_debt > annual_income * 0.5
    } else {
        medical_debt > 0.0
    };
    if heavy_medical_debt {
        score += 30.0;
        flags.push("high_medical_debt_burden".to_string());
    }

    if profile.monthly_expenses > annual_income / 12.0 {
        score += 25.0;
        flags.push("expenses_exceed_income".to_string());
    }

    let any_collections = profile
        .debts
        .iter()
        .any(|d| d.status == DebtStatus::Collections)
        || profile.bills.iter().any(|b| b.in_collections);
    if any_collections {
        score += 15.0;
        flags.push("accounts_in_collections".to_string());
    }

    (score.min(100.0), flags)
}

/// Typical hospital charity care discount ladder by poverty-level band.
fn charity_discount(fpl_percentage: f64) -> f64 {
    if fpl_percentage < 100.0 {
        1.0
    } else if fpl_percentage < 150.0 {
        0.90
    } else if fpl_percentage < 200.0 {
        0.75
    } else if fpl_percentage < 250.0 {
        0.60
    } else if fpl_percentage < 300.0 {
        0.50
    } else if fpl_percentage < 400.0 {
        0.35
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DebtAccount, IncomeSource};

    fn profile(household: u32, annual: f64) -> FinancialProfile {
        FinancialProfile {
            household_size: household,
            annual_income: annual,
            monthly_expenses: 0.0,
            income_sources: vec![],
            debts: vec![],
            insurance: None,
            bills: vec![],
            state: None,
            employment_status: None,
            has_regular_prescriptions: false,
            has_chronic_condition: false,
        }
    }

    #[test]
    fn low_income_household_scores_high_hardship() {
        // Household of 2 at $20,000: threshold 20,440, just under 100% FPL.
        let p = profile(2, 20_000.0);
        let f = analyze(&p, &EngineConfig::default()).unwrap();
        assert!((f.fpl_threshold - 20_440.0).abs() < 0.01);
        assert!(f.fpl_percentage < 100.0);
        assert!(f.fpl_percentage > 97.0);
        assert_eq!(f.income_tier, IncomeTier::VeryLow);
        // <100 (+40) and <200 (+25) stack.
        assert!(f.hardship_score >= 65.0);
        assert!(f.likely_medicaid_eligible);
        assert!((f.estimated_charity_discount - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn high_income_household_scores_low_hardship() {
        let p = profile(1, 150_000.0);
        let f = analyze(&p, &EngineConfig::default()).unwrap();
        assert_eq!(f.income_tier, IncomeTier::High);
        assert!(f.hardship_score < 10.0);
        assert!(!f.likely_charity_care_eligible);
    }

    #[test]
    fn medical_debt_over_half_income_adds_hardship() {
        let mut p = profile(1, 40_000.0);
        let base = analyze(&p, &EngineConfig::default()).unwrap().hardship_score;
        p.debts.push(DebtAccount {
            name: "hospital".into(),
            balance: 25_000.0,
            monthly_payment: 0.0,
            is_medical: true,
            is_secured: false,
            status: DebtStatus::Current,
        });
        let with_debt = analyze(&p, &EngineConfig::default()).unwrap().hardship_score;
        assert!((with_debt - base - 30.0).abs() < 0.01);
    }

    #[test]
    fn unstable_income_lowers_stability() {
        let mut p = profile(1, 36_000.0);
        p.income_sources = vec![
            IncomeSource {
                name: "gig".into(),
                monthly_amount: 1_500.0,
                stability: IncomeStability::Unstable,
                verified: true,
            },
            IncomeSource {
                name: "salary".into(),
                monthly_amount: 1_500.0,
                stability: IncomeStability::Stable,
                verified: true,
            },
        ];
        let f = analyze(&p, &EngineConfig::default()).unwrap();
        assert!((f.stability_score - 0.75).abs() < 0.01);
    }

    #[test]
    fn unverified_sources_take_a_haircut() {
        let mut p = profile(1, 36_000.0);
        p.income_sources = vec![IncomeSource {
            name: "salary".into(),
            monthly_amount: 3_000.0,
            stability: IncomeStability::Stable,
            verified: false,
        }];
        let f = analyze(&p, &EngineConfig::default()).unwrap();
        assert!((f.stability_score - 0.9).abs() < 0.01);
    }

    #[test]
    fn zero_income_is_degraded_not_fatal() {
        let p = profile(1, 0.0);
        let f = analyze(&p, &EngineConfig::default()).unwrap();
        assert!(f.confidence <= 0.3);
        assert!(!f.limitations.is_empty());
        assert_eq!(f.income_tier, IncomeTier::VeryLow);
    }

    #[test]
    fn payment_capacity_comes_from_disposable_income() {
        // $5,000/mo income, $4,000/mo expenses: capacity on the $1,000
        // that is actually free, not on gross income.
        let mut p = profile(1, 60_000.0);
        p.monthly_expenses = 4_000.0;
        let f = analyze(&p, &EngineConfig::default()).unwrap();
        assert!((f.medical_payment_capacity - 100.0).abs() < 0.01);

        // Expenses consuming all income leave zero capacity, never a
        // negative one.
        p.monthly_expenses = 5_000.0;
        let f = analyze(&p, &EngineConfig::default()).unwrap();
        assert!((f.medical_payment_capacity - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hardship_flags_name_each_condition() {
        let mut p = profile(2, 18_000.0);
        p.monthly_expenses = 2_000.0;
        p.debts.push(DebtAccount {
            name: "er".into(),
            balance: 12_000.0,
            monthly_payment: 0.0,
            is_medical: true,
            is_secured: false,
            status: DebtStatus::Collections,
        });
        let f = analyze(&p, &EngineConfig::default()).unwrap();
        for flag in [
            "below_poverty_line",
            "low_income",
            "high_medical_debt_burden",
            "expenses_exceed_income",
            "accounts_in_collections",
        ] {
            assert!(f.hardship_flags.iter().any(|fl| fl == flag), "{}", flag);
        }

        let comfortable = analyze(&profile(1, 150_000.0), &EngineConfig::default()).unwrap();
        assert!(comfortable.hardship_flags.is_empty());
    }

    #[test]
    fn non_finite_income_is_an_analysis_error() {
        let p = profile(1, f64::NAN);
        assert!(matches!(
            analyze(&p, &EngineConfig::default()),
            Err(Error::Analysis(_))
        ));
    }

    #[test]
    fn hardship_is_capped_at_100() {
        let mut p = profile(1, 10_000.0);
        p.monthly_expenses = 2_000.0;
        p.debts.push(DebtAccount {
            name: "old er bill".into(),
            balance: 20_000.0,
            monthly_payment: 0.0,
            is_medical: true,
            is_secured: false,
            status: DebtStatus::Collections,
        });
        let f = analyze(&p, &EngineConfig::default()).unwrap();
        assert!((f.hardship_score - 100.0).abs() < f64::EPSILON);
    }
}

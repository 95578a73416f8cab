//! Core data model: the patient financial profile and everything in it.
//!
//! All input structures are plain serde values. Monetary amounts are f64
//! dollars. Enums serialize as snake_case strings and carry
//! `as_str`/`Display`/`FromStr` for CLI and report formatting.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Complete financial picture for one patient household.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialProfile {
    /// Number of people in the household (must be >= 1).
    pub household_size: u32,
    /// Gross annual income in dollars. May be 0 if only income sources
    /// are provided.
    #[serde(default)]
    pub annual_income: f64,
    /// Total monthly living expenses (rent, food, utilities, ...).
    #[serde(default)]
    pub monthly_expenses: f64,
    #[serde(default)]
    pub income_sources: Vec<IncomeSource>,
    #[serde(default)]
    pub debts: Vec<DebtAccount>,
    #[serde(default)]
    pub insurance: Option<InsuranceInfo>,
    #[serde(default)]
    pub bills: Vec<Bill>,
    /// Two-letter state code, if known. Affects nothing numeric today but
    /// is surfaced in balance-billing guidance.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub employment_status: Option<String>,
    #[serde(default)]
    pub has_regular_prescriptions: bool,
    #[serde(default)]
    pub has_chronic_condition: bool,
}

impl FinancialProfile {
    /// Validate the profile-level fields. Failures here abort the whole
    /// request; per-bill data problems are handled (and recorded) by the
    /// bill analyzer instead.
    pub fn validate(&self) -> Result<()> {
        if self.household_size < 1 {
            return Err(Error::InvalidProfile(
                "household_size must be at least 1".into(),
            ));
        }
        if !self.annual_income.is_finite() || self.annual_income < 0.0 {
            return Err(Error::InvalidProfile(
                "annual_income must be a non-negative number".into(),
            ));
        }
        if !self.monthly_expenses.is_finite() || self.monthly_expenses < 0.0 {
            return Err(Error::InvalidProfile(
                "monthly_expenses must be a non-negative number".into(),
            ));
        }
        for source in &self.income_sources {
            if source.monthly_amount < 0.0 {
                return Err(Error::InvalidProfile(format!(
                    "income source '{}' has a negative amount",
                    source.name
                )));
            }
        }
        for debt in &self.debts {
            if debt.balance < 0.0 {
                return Err(Error::InvalidProfile(format!(
                    "debt account '{}' has a negative balance",
                    debt.name
                )));
            }
            if debt.monthly_payment < 0.0 {
                return Err(Error::InvalidProfile(format!(
                    "debt account '{}' has a negative monthly payment",
                    debt.name
                )));
            }
        }
        if let Some(ins) = &self.insurance {
            ins.validate()?;
        }
        Ok(())
    }

    /// Effective annual income: the stated figure, or income sources
    /// annualized when no annual figure was provided.
    pub fn effective_annual_income(&self) -> f64 {
        if self.annual_income > 0.0 {
            self.annual_income
        } else {
            self.income_sources
                .iter()
                .map(|s| s.monthly_amount)
                .sum::<f64>()
                * 12.0
        }
    }

    /// Effective monthly income derived from [`effective_annual_income`].
    ///
    /// [`effective_annual_income`]: Self::effective_annual_income
    pub fn monthly_income(&self) -> f64 {
        self.effective_annual_income() / 12.0
    }

    /// Total medical debt: medical debt account balances plus unpaid
    /// patient responsibility across bills.
    pub fn total_medical_debt(&self) -> f64 {
        let accounts: f64 = self
            .debts
            .iter()
            .filter(|d| d.is_medical)
            .map(|d| d.balance)
            .sum();
        let bills: f64 = self
            .bills
            .iter()
            .filter(|b| b.status != BillStatus::Paid)
            .map(|b| b.patient_responsibility)
            .sum();
        accounts + bills
    }

    /// Unpaid patient responsibility across all bills.
    pub fn total_amount_owed(&self) -> f64 {
        self.bills
            .iter()
            .filter(|b| b.status != BillStatus::Paid)
            .map(|b| b.patient_responsibility)
            .sum()
    }
}

/// One stream of household income.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeSource {
    pub name: String,
    pub monthly_amount: f64,
    #[serde(default)]
    pub stability: IncomeStability,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeStability {
    VeryStable,
    #[default]
    Stable,
    Unstable,
}

impl IncomeStability {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncomeStability::VeryStable => "very_stable",
            IncomeStability::Stable => "stable",
            IncomeStability::Unstable => "unstable",
        }
    }
}

impl fmt::Display for IncomeStability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IncomeStability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "very_stable" => Ok(IncomeStability::VeryStable),
            "stable" => Ok(IncomeStability::Stable),
            "unstable" => Ok(IncomeStability::Unstable),
            _ => Err(format!("unknown income stability: {}", s)),
        }
    }
}

/// A single debt account (medical or otherwise).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtAccount {
    pub name: String,
    pub balance: f64,
    #[serde(default)]
    pub monthly_payment: f64,
    #[serde(default)]
    pub is_medical: bool,
    #[serde(default)]
    pub is_secured: bool,
    #[serde(default)]
    pub status: DebtStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    #[default]
    Current,
    PastDue,
    #[serde(rename = "delinquent_30")]
    Delinquent30,
    #[serde(rename = "delinquent_60")]
    Delinquent60,
    #[serde(rename = "delinquent_90")]
    Delinquent90,
    Collections,
}

impl DebtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtStatus::Current => "current",
            DebtStatus::PastDue => "past_due",
            DebtStatus::Delinquent30 => "delinquent_30",
            DebtStatus::Delinquent60 => "delinquent_60",
            DebtStatus::Delinquent90 => "delinquent_90",
            DebtStatus::Collections => "collections",
        }
    }

    /// Delinquency indicator weight used for the collections-risk score.
    /// The overall score is the maximum weight across accounts, not a sum.
    pub fn risk_weight(&self) -> f64 {
        match self {
            DebtStatus::Current => 0.0,
            DebtStatus::PastDue => 0.30,
            DebtStatus::Delinquent30 => 0.35,
            DebtStatus::Delinquent60 => 0.60,
            DebtStatus::Delinquent90 => 0.85,
            DebtStatus::Collections => 0.95,
        }
    }
}

impl fmt::Display for DebtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DebtStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "current" => Ok(DebtStatus::Current),
            "past_due" => Ok(DebtStatus::PastDue),
            "delinquent_30" => Ok(DebtStatus::Delinquent30),
            "delinquent_60" => Ok(DebtStatus::Delinquent60),
            "delinquent_90" => Ok(DebtStatus::Delinquent90),
            "collections" => Ok(DebtStatus::Collections),
            _ => Err(format!("unknown debt status: {}", s)),
        }
    }
}

/// Insurance plan accumulators and plan details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceInfo {
    pub deductible: f64,
    #[serde(default)]
    pub deductible_used: f64,
    pub oop_max: f64,
    #[serde(default)]
    pub oop_used: f64,
    /// Patient's share of allowed costs after the deductible, 0.0-1.0.
    #[serde(default)]
    pub coinsurance: f64,
    /// Fraction of billed charges the plan typically covers, 0.0-1.0.
    #[serde(default = "default_coverage")]
    pub coverage_percentage: f64,
    #[serde(default)]
    pub network_status: NetworkStatus,
    #[serde(default)]
    pub plan_year_end: Option<NaiveDate>,
}

fn default_coverage() -> f64 {
    0.8
}

impl InsuranceInfo {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("deductible", self.deductible),
            ("deductible_used", self.deductible_used),
            ("oop_max", self.oop_max),
            ("oop_used", self.oop_used),
        ] {
            if value < 0.0 {
                return Err(Error::InvalidProfile(format!(
                    "insurance {} cannot be negative",
                    field
                )));
            }
        }
        for (field, value) in [
            ("coinsurance", self.coinsurance),
            ("coverage_percentage", self.coverage_percentage),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidProfile(format!(
                    "insurance {} must be between 0 and 1",
                    field
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStatus {
    InNetwork,
    OutOfNetwork,
    #[default]
    Unknown,
}

impl NetworkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkStatus::InNetwork => "in_network",
            NetworkStatus::OutOfNetwork => "out_of_network",
            NetworkStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NetworkStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "in_network" => Ok(NetworkStatus::InNetwork),
            "out_of_network" => Ok(NetworkStatus::OutOfNetwork),
            "unknown" => Ok(NetworkStatus::Unknown),
            _ => Err(format!("unknown network status: {}", s)),
        }
    }
}

/// A medical bill with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub provider: String,
    #[serde(default)]
    pub provider_type: ProviderType,
    pub service_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub total_amount: f64,
    #[serde(default)]
    pub insurance_paid: Option<f64>,
    pub patient_responsibility: f64,
    #[serde(default)]
    pub status: BillStatus,
    #[serde(default)]
    pub network_status: Option<NetworkStatus>,
    #[serde(default)]
    pub is_emergency: bool,
    #[serde(default)]
    pub in_collections: bool,
}

impl Bill {
    /// Due date, defaulting to 30 days after the analysis date when the
    /// bill does not carry one.
    pub fn effective_due_date(&self, today: NaiveDate) -> NaiveDate {
        self.due_date
            .unwrap_or_else(|| today + chrono::Duration::days(30))
    }

    pub fn is_unpaid(&self) -> bool {
        self.status != BillStatus::Paid && self.patient_responsibility > 0.0
    }
}

/// One charge line on a bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    #[serde(default)]
    pub procedure_code: Option<String>,
    pub charge: f64,
    #[serde(default)]
    pub allowed_amount: Option<f64>,
    /// Defaults to the bill's service date when absent.
    #[serde(default)]
    pub service_date: Option<NaiveDate>,
    #[serde(default)]
    pub patient_responsibility: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    #[default]
    Pending,
    Negotiating,
    PaymentPlan,
    Paid,
    Disputed,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Negotiating => "negotiating",
            BillStatus::PaymentPlan => "payment_plan",
            BillStatus::Paid => "paid",
            BillStatus::Disputed => "disputed",
        }
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BillStatus::Pending),
            "negotiating" => Ok(BillStatus::Negotiating),
            "payment_plan" => Ok(BillStatus::PaymentPlan),
            "paid" => Ok(BillStatus::Paid),
            "disputed" => Ok(BillStatus::Disputed),
            _ => Err(format!("unknown bill status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Hospital,
    HealthSystem,
    Physician,
    Lab,
    Imaging,
    #[default]
    Other,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Hospital => "hospital",
            ProviderType::HealthSystem => "health_system",
            ProviderType::Physician => "physician",
            ProviderType::Lab => "lab",
            ProviderType::Imaging => "imaging",
            ProviderType::Other => "other",
        }
    }

    /// Hospital-affiliated providers are the ones with charity care
    /// obligations under IRS 501(r).
    pub fn offers_charity_care(&self) -> bool {
        matches!(self, ProviderType::Hospital | ProviderType::HealthSystem)
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "hospital" => Ok(ProviderType::Hospital),
            "health_system" => Ok(ProviderType::HealthSystem),
            "physician" => Ok(ProviderType::Physician),
            "lab" => Ok(ProviderType::Lab),
            "imaging" => Ok(ProviderType::Imaging),
            "other" => Ok(ProviderType::Other),
            _ => Err(format!("unknown provider type: {}", s)),
        }
    }
}

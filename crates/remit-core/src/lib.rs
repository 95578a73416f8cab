//! Rule-based analysis of household medical bills and finances.
//!
//! Feed a [`FinancialProfile`] to an [`Engine`] and get back a
//! [`NavigationPlanResponse`]: billing issues, risk assessment, ranked
//! recommendations, and a time-bucketed action plan. The pipeline is
//! pure and synchronous; the caller supplies the analysis date, so the
//! same profile and date always produce the same plan.
//!
//! ```no_run
//! use remit_core::{Engine, EngineConfig, FinancialProfile};
//!
//! # fn main() -> remit_core::Result<()> {
//! let profile: FinancialProfile = serde_json::from_str("{}")?;
//! let engine = Engine::new(EngineConfig::default())?;
//! let today = chrono::Local::now().date_naive();
//! let plan = engine.generate_plan(&profile, today)?;
//! println!("{}", plan.executive_summary);
//! # Ok(())
//! # }
//! ```

pub mod analyzers;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod plan;
pub mod ranking;
pub mod risk;
pub mod rules;

pub use analyzers::{
    AnalyzerFindings, BillingIssue, BillingIssueKind, BillsFinding, DebtFinding, IncomeFinding,
    InsuranceFinding, NegotiationOpportunity, NegotiationStrategy,
};
pub use config::{EngineConfig, FplConfig, RankingWeights, RiskWeights};
pub use engine::Engine;
pub use error::{Error, Result};
pub use models::{
    Bill, BillStatus, DebtAccount, DebtStatus, FinancialProfile, IncomeSource, IncomeStability,
    InsuranceInfo, LineItem, NetworkStatus, ProviderType,
};
pub use plan::{ActionPlan, Horizon, NavigationPlanResponse, PlanStep};
pub use ranking::{RankFactors, RankedRecommendation};
pub use risk::{RiskAssessment, RiskCategory, RiskDimension};
pub use rules::{
    ActionCategory, Priority, Recommendation, Rule, RuleContext, SavingsEstimate, SkippedRule,
};

/// Analyze income in isolation.
pub use analyzers::income::analyze as analyze_income;
/// Analyze debt in isolation; requires an income finding.
pub use analyzers::debt::analyze as analyze_debt;
/// Analyze insurance coverage in isolation.
pub use analyzers::insurance::analyze as analyze_insurance;
/// Analyze bills in isolation; requires an income finding.
pub use analyzers::bill::analyze as analyze_bills;

//! Declarative rule engine.
//!
//! Each rule pairs a condition with savings math, effort, documents, and
//! action steps. The engine makes one pass over the catalog in
//! declaration order; a rule whose savings calculator fails is skipped
//! and recorded, never fatal.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analyzers::{
    AnalyzerFindings, AssistanceProgram, BillingIssueKind, NegotiationStrategy,
};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::models::{BillStatus, FinancialProfile};
use crate::risk::RiskAssessment;

/// Everything a rule may inspect. One shared context per run: rules
/// aggregate across bills and emit at most one recommendation each.
pub struct RuleContext<'a> {
    pub profile: &'a FinancialProfile,
    pub config: &'a EngineConfig,
    pub today: NaiveDate,
    pub findings: &'a AnalyzerFindings,
    pub risk: &'a RiskAssessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
    Informational,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Informational => "informational",
        }
    }

    /// Urgency adjustment applied during ranking.
    pub fn urgency_adjustment(&self) -> f64 {
        match self {
            Priority::Critical => 20.0,
            Priority::High => 10.0,
            Priority::Medium => 0.0,
            Priority::Low => -10.0,
            Priority::Informational => -20.0,
        }
    }

    /// Ordering rank for tie-breaks; higher is more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
            Priority::Informational => 0,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Dispute,
    Appeal,
    Negotiation,
    Assistance,
    Payment,
    Verification,
}

impl ActionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::Dispute => "dispute",
            ActionCategory::Appeal => "appeal",
            ActionCategory::Negotiation => "negotiation",
            ActionCategory::Assistance => "assistance",
            ActionCategory::Payment => "payment",
            ActionCategory::Verification => "verification",
        }
    }

    /// Category contribution to the risk-reduction ranking factor.
    pub fn risk_reduction_boost(&self) -> f64 {
        match self {
            ActionCategory::Assistance => 30.0,
            ActionCategory::Dispute => 20.0,
            ActionCategory::Appeal => 20.0,
            ActionCategory::Negotiation => 15.0,
            ActionCategory::Payment => 10.0,
            ActionCategory::Verification => 0.0,
        }
    }
}

impl fmt::Display for ActionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Savings range with a confidence on the expected figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsEstimate {
    pub minimum: f64,
    pub expected: f64,
    pub maximum: f64,
    pub confidence: f64,
}

impl SavingsEstimate {
    pub fn zero() -> Self {
        Self {
            minimum: 0.0,
            expected: 0.0,
            maximum: 0.0,
            confidence: 1.0,
        }
    }

    /// Band around a base amount.
    pub fn banded(base: f64, min_frac: f64, expected_frac: f64, max_frac: f64, confidence: f64) -> Self {
        Self {
            minimum: base * min_frac,
            expected: base * expected_frac,
            maximum: base * max_frac,
            confidence,
        }
    }
}

pub type ConditionFn = fn(&RuleContext) -> bool;
pub type SavingsFn = fn(&RuleContext) -> Result<SavingsEstimate>;
pub type DeadlineFn = fn(&RuleContext) -> Option<NaiveDate>;
pub type WarningsFn = fn(&RuleContext) -> Vec<String>;

/// A single decision rule.
pub struct Rule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: ActionCategory,
    pub base_priority: Priority,
    pub effort_minutes: u32,
    pub success_probability: f64,
    /// Risk points this action removes if completed, 0-25.
    pub risk_reduction: f64,
    pub required_documents: &'static [&'static str],
    pub action_steps: &'static [&'static str],
    pub condition: ConditionFn,
    pub savings: SavingsFn,
    pub deadline: Option<DeadlineFn>,
    pub warnings: Option<WarningsFn>,
}

/// A fired rule, ready for ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub rule_id: String,
    pub title: String,
    pub description: String,
    pub category: ActionCategory,
    pub priority: Priority,
    pub savings: SavingsEstimate,
    pub effort_minutes: u32,
    pub success_probability: f64,
    pub risk_reduction: f64,
    pub required_documents: Vec<String>,
    pub action_steps: Vec<String>,
    pub deadline: Option<NaiveDate>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRule {
    pub rule_id: String,
    pub reason: String,
}

/// Evaluate the catalog. Failing savings calculators skip their rule and
/// record why; the scan continues.
pub fn evaluate(catalog: &[Rule], ctx: &RuleContext) -> (Vec<Recommendation>, Vec<SkippedRule>) {
    let mut fired = Vec::new();
    let mut skipped = Vec::new();

    for rule in catalog {
        if !(rule.condition)(ctx) {
            continue;
        }
        match (rule.savings)(ctx) {
            Ok(savings) => {
                let deadline = rule.deadline.and_then(|f| f(ctx));
                let warnings = rule.warnings.map(|f| f(ctx)).unwrap_or_default();
                fired.push(Recommendation {
                    rule_id: rule.id.to_string(),
                    title: rule.name.to_string(),
                    description: rule.description.to_string(),
                    category: rule.category,
                    priority: rule.base_priority,
                    savings,
                    effort_minutes: rule.effort_minutes,
                    success_probability: rule.success_probability,
                    risk_reduction: rule.risk_reduction,
                    required_documents: rule
                        .required_documents
                        .iter()
                        .map(|d| d.to_string())
                        .collect(),
                    action_steps: rule.action_steps.iter().map(|s| s.to_string()).collect(),
                    deadline,
                    warnings,
                });
            }
            Err(e) => {
                tracing::warn!(rule_id = rule.id, error = %e, "rule evaluation failed; skipping");
                skipped.push(SkippedRule {
                    rule_id: rule.id.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    tracing::debug!(fired = fired.len(), skipped = skipped.len(), "rule pass complete");
    (fired, skipped)
}

// --- catalog helpers -------------------------------------------------------

fn issue_amount(ctx: &RuleContext, kind: BillingIssueKind) -> f64 {
    ctx.findings
        .bills
        .issues_of_kind(kind)
        .map(|i| i.amount)
        .sum()
}

fn negotiation_balance(ctx: &RuleContext, strategy: NegotiationStrategy) -> f64 {
    // Balance across the bills carrying this opportunity, deduplicated by
    // bill since a bill can hold several opportunities.
    let ids: Vec<&str> = ctx
        .findings
        .bills
        .negotiations_of(strategy)
        .map(|n| n.bill_id.as_str())
        .collect();
    ctx.profile
        .bills
        .iter()
        .filter(|b| ids.contains(&b.id.as_str()))
        .map(|b| b.patient_responsibility)
        .sum()
}

fn earliest_affected_due_date(ctx: &RuleContext, kind: BillingIssueKind) -> Option<NaiveDate> {
    let ids: Vec<&str> = ctx
        .findings
        .bills
        .issues_of_kind(kind)
        .map(|i| i.bill_id.as_str())
        .collect();
    ctx.profile
        .bills
        .iter()
        .filter(|b| ids.contains(&b.id.as_str()))
        .map(|b| b.effective_due_date(ctx.today))
        .min()
}

fn require_positive(amount: f64, what: &str) -> Result<f64> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::Rule(format!(
            "cannot estimate savings: {} amount is unavailable",
            what
        )))
    }
}

/// The built-in rule catalog, in evaluation order.
pub fn default_catalog() -> Vec<Rule> {
    vec![
        Rule {
            id: "R001",
            name: "Dispute Duplicate Charges",
            description: "Challenge charges billed more than once for the same service",
            category: ActionCategory::Dispute,
            base_priority: Priority::High,
            effort_minutes: 30,
            success_probability: 0.9,
            risk_reduction: 15.0,
            required_documents: &["itemized_bill", "eob"],
            action_steps: &[
                "Write a formal dispute letter listing each duplicated line",
                "Include copies of the itemized bill and EOB",
                "Send via certified mail with return receipt",
                "Follow up within 30 days if no response",
            ],
            condition: |ctx| {
                ctx.findings
                    .bills
                    .issues_of_kind(BillingIssueKind::DuplicateCharge)
                    .next()
                    .is_some()
            },
            savings: |ctx| {
                let amount = require_positive(
                    issue_amount(ctx, BillingIssueKind::DuplicateCharge),
                    "duplicate charge",
                )?;
                Ok(SavingsEstimate::banded(amount, 0.8, 0.95, 1.0, 0.9))
            },
            deadline: Some(|ctx| earliest_affected_due_date(ctx, BillingIssueKind::DuplicateCharge)),
            warnings: Some(|ctx| {
                let any_pending = ctx
                    .profile
                    .bills
                    .iter()
                    .any(|b| b.status == BillStatus::Pending);
                if any_pending {
                    vec!["Dispute before paying to preserve your rights".to_string()]
                } else {
                    vec![]
                }
            }),
        },
        Rule {
            id: "R002",
            name: "Dispute Billing Errors",
            description: "Challenge unbundled and overcharged line items",
            category: ActionCategory::Dispute,
            base_priority: Priority::High,
            effort_minutes: 45,
            success_probability: 0.75,
            risk_reduction: 12.0,
            required_documents: &["itemized_bill", "eob", "medical_records"],
            action_steps: &[
                "List each suspect line with the billing rule it breaks",
                "Request a coding review from the provider's billing office",
                "Escalate to your insurer's provider relations if unresolved",
            ],
            condition: |ctx| {
                ctx.findings
                    .bills
                    .issues_of_kind(BillingIssueKind::Unbundling)
                    .next()
                    .is_some()
                    || ctx
                        .findings
                        .bills
                        .issues_of_kind(BillingIssueKind::Overcharge)
                        .next()
                        .is_some()
            },
            savings: |ctx| {
                let amount = require_positive(
                    issue_amount(ctx, BillingIssueKind::Unbundling)
                        + issue_amount(ctx, BillingIssueKind::Overcharge),
                    "billing error",
                )?;
                Ok(SavingsEstimate::banded(amount, 0.6, 0.85, 1.0, 0.75))
            },
            deadline: None,
            warnings: None,
        },
        Rule {
            id: "R003",
            name: "Challenge Balance Billing",
            description: "Dispute balance billing on emergency out-of-network care",
            category: ActionCategory::Dispute,
            base_priority: Priority::Critical,
            effort_minutes: 30,
            success_probability: 0.8,
            risk_reduction: 20.0,
            required_documents: &["eob", "itemized_bill"],
            action_steps: &[
                "Cite the No Surprises Act protections for emergency care",
                "Demand the bill be reprocessed at the in-network rate",
                "File a complaint with your state insurance commissioner if refused",
            ],
            condition: |ctx| {
                ctx.findings
                    .bills
                    .issues_of_kind(BillingIssueKind::BalanceBilling)
                    .next()
                    .is_some()
            },
            savings: |ctx| {
                let amount = require_positive(
                    issue_amount(ctx, BillingIssueKind::BalanceBilling),
                    "balance billing",
                )?;
                Ok(SavingsEstimate::banded(amount, 0.7, 1.0, 1.0, 0.8))
            },
            deadline: Some(|ctx| earliest_affected_due_date(ctx, BillingIssueKind::BalanceBilling)),
            warnings: Some(|_| {
                vec![
                    "Balance billing for emergency services is prohibited in most cases".to_string(),
                    "Do not pay the disputed portion while the complaint is open".to_string(),
                ]
            }),
        },
        Rule {
            id: "R004",
            name: "Correct Preventive Care Billing",
            description: "Have preventive services reprocessed at 100% coverage",
            category: ActionCategory::Appeal,
            base_priority: Priority::High,
            effort_minutes: 40,
            success_probability: 0.7,
            risk_reduction: 10.0,
            required_documents: &["eob", "itemized_bill"],
            action_steps: &[
                "Ask the provider to confirm the service was coded as preventive",
                "Request reprocessing through your insurer citing ACA preventive coverage",
                "Appeal in writing if the claim is not corrected",
            ],
            condition: |ctx| {
                ctx.findings
                    .bills
                    .issues_of_kind(BillingIssueKind::PreventiveCostShare)
                    .next()
                    .is_some()
            },
            savings: |ctx| {
                let amount = require_positive(
                    issue_amount(ctx, BillingIssueKind::PreventiveCostShare),
                    "preventive cost share",
                )?;
                Ok(SavingsEstimate::banded(amount, 0.5, 0.85, 1.0, 0.8))
            },
            deadline: None,
            warnings: None,
        },
        Rule {
            id: "R005",
            name: "Request Itemized Bills",
            description: "Get a line-item breakdown before paying large summary bills",
            category: ActionCategory::Verification,
            base_priority: Priority::High,
            effort_minutes: 15,
            success_probability: 0.95,
            risk_reduction: 5.0,
            required_documents: &[],
            action_steps: &[
                "Call the billing department on each statement",
                "Request an itemized bill with all procedure codes",
                "Review every line for accuracy when it arrives",
            ],
            condition: |ctx| !ctx.findings.bills.itemization_candidates.is_empty(),
            savings: |ctx| {
                let ids = &ctx.findings.bills.itemization_candidates;
                let balance: f64 = ctx
                    .profile
                    .bills
                    .iter()
                    .filter(|b| ids.contains(&b.id))
                    .map(|b| b.patient_responsibility)
                    .sum();
                let balance = require_positive(balance, "summary bill")?;
                Ok(SavingsEstimate {
                    minimum: 0.0,
                    expected: balance * 0.15,
                    maximum: balance * 0.35,
                    confidence: 0.7,
                })
            },
            deadline: None,
            warnings: None,
        },
        Rule {
            id: "R006",
            name: "Verify Insurance Claim Submission",
            description: "Confirm large bills were actually submitted to insurance",
            category: ActionCategory::Verification,
            base_priority: Priority::High,
            effort_minutes: 20,
            success_probability: 0.5,
            risk_reduction: 8.0,
            required_documents: &["insurance_card"],
            action_steps: &[
                "Call the insurer and ask whether a claim exists for each bill",
                "If not, ask the provider to submit or resubmit the claim",
                "Request the bill be placed on hold while the claim processes",
            ],
            condition: |ctx| {
                ctx.profile.insurance.is_some()
                    && ctx.profile.bills.iter().any(|b| {
                        b.status == BillStatus::Pending
                            && b.insurance_paid.unwrap_or(0.0) == 0.0
                            && b.total_amount > 200.0
                    })
            },
            savings: |ctx| {
                let balance: f64 = ctx
                    .profile
                    .bills
                    .iter()
                    .filter(|b| {
                        b.status == BillStatus::Pending
                            && b.insurance_paid.unwrap_or(0.0) == 0.0
                            && b.total_amount > 200.0
                    })
                    .map(|b| b.patient_responsibility)
                    .sum();
                let balance = require_positive(balance, "unsubmitted claim")?;
                Ok(SavingsEstimate {
                    minimum: 0.0,
                    expected: balance * 0.6,
                    maximum: balance * 0.9,
                    confidence: 0.5,
                })
            },
            deadline: None,
            warnings: None,
        },
        Rule {
            id: "R007",
            name: "Apply for Hospital Charity Care",
            description: "Apply for financial assistance on hospital bills",
            category: ActionCategory::Assistance,
            base_priority: Priority::High,
            effort_minutes: 60,
            success_probability: 0.7,
            risk_reduction: 25.0,
            required_documents: &[
                "proof_of_income",
                "tax_return",
                "bank_statements",
                "id_document",
                "bills",
            ],
            action_steps: &[
                "Request the financial assistance application from each hospital",
                "Gather income documentation for the full household",
                "Submit before making any payments",
                "Follow up weekly on application status",
            ],
            condition: |ctx| {
                ctx.findings.income.likely_charity_care_eligible
                    && hospital_balance(ctx) > 1_000.0
            },
            savings: |ctx| {
                let balance = require_positive(hospital_balance(ctx), "hospital")?;
                let discount = ctx.findings.income.estimated_charity_discount;
                let confidence = if ctx.findings.income.fpl_percentage < 300.0 {
                    0.7
                } else {
                    0.5
                };
                Ok(SavingsEstimate {
                    minimum: balance * discount * 0.5,
                    expected: balance * discount,
                    maximum: balance,
                    confidence,
                })
            },
            deadline: None,
            warnings: Some(|_| {
                vec![
                    "Apply before making any payments".to_string(),
                    "Some programs limit retroactive coverage".to_string(),
                ]
            }),
        },
        Rule {
            id: "R008",
            name: "Pursue Medical Debt Relief",
            description: "Apply to a debt relief program for large medical balances",
            category: ActionCategory::Assistance,
            base_priority: Priority::Medium,
            effort_minutes: 45,
            success_probability: 0.6,
            risk_reduction: 18.0,
            required_documents: &["proof_of_income", "bills"],
            action_steps: &[
                "Identify medical debt relief programs serving your state",
                "Submit income and debt documentation",
                "Keep paying minimums on other accounts while the case is open",
            ],
            condition: |ctx| {
                ctx.findings
                    .debt
                    .qualification(AssistanceProgram::MedicalDebtRelief)
                    .is_some()
            },
            savings: |ctx| {
                let debt = require_positive(ctx.findings.debt.medical_debt, "medical debt")?;
                let likelihood = ctx
                    .findings
                    .debt
                    .qualification(AssistanceProgram::MedicalDebtRelief)
                    .map(|q| q.likelihood)
                    .unwrap_or(0.0);
                Ok(SavingsEstimate {
                    minimum: debt * 0.3,
                    expected: debt * 0.6,
                    maximum: debt,
                    confidence: likelihood,
                })
            },
            deadline: None,
            warnings: None,
        },
        Rule {
            id: "R009",
            name: "Negotiate Prompt-Pay Discount",
            description: "Request a discount for paying recent bills quickly",
            category: ActionCategory::Negotiation,
            base_priority: Priority::Medium,
            effort_minutes: 20,
            success_probability: 0.7,
            risk_reduction: 8.0,
            required_documents: &[],
            action_steps: &[
                "Call billing and ask about a prompt-pay or lump-sum discount",
                "Offer to pay immediately in exchange for 20% off",
                "Get the agreed reduction in writing before paying",
            ],
            condition: |ctx| {
                ctx.findings
                    .bills
                    .negotiations_of(NegotiationStrategy::PromptPay)
                    .next()
                    .is_some()
            },
            savings: |ctx| {
                let balance = require_positive(
                    negotiation_balance(ctx, NegotiationStrategy::PromptPay),
                    "prompt-pay",
                )?;
                Ok(SavingsEstimate::banded(balance, 0.15, 0.20, 0.25, 0.70))
            },
            deadline: None,
            warnings: None,
        },
        Rule {
            id: "R010",
            name: "Request Financial Hardship Discount",
            description: "Ask providers for an income-based discount",
            category: ActionCategory::Negotiation,
            base_priority: Priority::Medium,
            effort_minutes: 25,
            success_probability: 0.6,
            risk_reduction: 10.0,
            required_documents: &["proof_of_income"],
            action_steps: &[
                "Explain your household income situation to the billing office",
                "Ask specifically for their financial hardship discount policy",
                "Provide income documentation if requested",
                "Get any reduction in writing",
            ],
            condition: |ctx| {
                ctx.findings
                    .bills
                    .negotiations_of(NegotiationStrategy::HardshipDiscount)
                    .next()
                    .is_some()
            },
            savings: |ctx| {
                let balance = require_positive(
                    negotiation_balance(ctx, NegotiationStrategy::HardshipDiscount),
                    "hardship discount",
                )?;
                let discount = ctx
                    .findings
                    .bills
                    .negotiations_of(NegotiationStrategy::HardshipDiscount)
                    .map(|n| n.expected_discount)
                    .fold(0.0, f64::max);
                Ok(SavingsEstimate {
                    minimum: balance * discount * 0.5,
                    expected: balance * discount,
                    maximum: balance * (discount + 0.1).min(1.0),
                    confidence: 0.6,
                })
            },
            deadline: None,
            warnings: None,
        },
        Rule {
            id: "R011",
            name: "Negotiate Cash-Pay Rate",
            description: "Request the self-pay rate when no insurance applies",
            category: ActionCategory::Negotiation,
            base_priority: Priority::Medium,
            effort_minutes: 20,
            success_probability: 0.55,
            risk_reduction: 8.0,
            required_documents: &[],
            action_steps: &[
                "Ask for the provider's self-pay or cash price for each service",
                "Compare against the billed charges",
                "Request the bill be rerated to the cash price",
            ],
            condition: |ctx| {
                ctx.profile.insurance.is_none()
                    && ctx
                        .findings
                        .bills
                        .negotiations_of(NegotiationStrategy::CashPay)
                        .next()
                        .is_some()
            },
            savings: |ctx| {
                let balance = require_positive(
                    negotiation_balance(ctx, NegotiationStrategy::CashPay),
                    "cash-pay",
                )?;
                Ok(SavingsEstimate::banded(balance, 0.30, 0.40, 0.50, 0.55))
            },
            deadline: None,
            warnings: None,
        },
        Rule {
            id: "R012",
            name: "Set Up Interest-Free Payment Plan",
            description: "Spread unaffordable balances into manageable monthly payments",
            category: ActionCategory::Payment,
            base_priority: Priority::Medium,
            effort_minutes: 20,
            success_probability: 0.95,
            risk_reduction: 12.0,
            required_documents: &[],
            action_steps: &[
                "Calculate an affordable monthly payment from your budget",
                "Call billing and request an interest-free plan at that level",
                "Get the terms in writing before the first payment",
                "Set up automatic payments to avoid missed-payment fees",
            ],
            condition: |ctx| {
                let capacity = ctx.findings.income.medical_payment_capacity;
                ctx.profile.total_amount_owed() > capacity * 2.0
                    && ctx.profile.total_amount_owed() > 0.0
            },
            // Payment plans spread cost rather than reduce it.
            savings: |_| Ok(SavingsEstimate::zero()),
            deadline: None,
            warnings: Some(|ctx| {
                let mut w = Vec::new();
                if ctx.profile.total_amount_owed() > ctx.findings.income.monthly_income * 12.0 {
                    w.push("Payment plan term may exceed 12 months".to_string());
                }
                w
            }),
        },
        Rule {
            id: "R013",
            name: "Address Accounts in Collections",
            description: "Validate and resolve debts that have gone to collections",
            category: ActionCategory::Payment,
            base_priority: Priority::Critical,
            effort_minutes: 45,
            success_probability: 0.5,
            risk_reduction: 25.0,
            required_documents: &["debt_validation_letter"],
            action_steps: &[
                "Send a debt validation request within 30 days of first contact",
                "Do not acknowledge the debt until it is validated",
                "Negotiate a settlement or payment plan once validated",
                "Get any settlement in writing before paying",
            ],
            condition: |ctx| {
                ctx.findings.debt.accounts_in_collections > 0
            },
            savings: |ctx| {
                let balance: f64 = ctx
                    .profile
                    .debts
                    .iter()
                    .filter(|d| d.status == crate::models::DebtStatus::Collections)
                    .map(|d| d.balance)
                    .sum::<f64>()
                    + ctx
                        .profile
                        .bills
                        .iter()
                        .filter(|b| b.in_collections && b.is_unpaid())
                        .map(|b| b.patient_responsibility)
                        .sum::<f64>();
                let balance = require_positive(balance, "collections")?;
                Ok(SavingsEstimate::banded(balance, 0.25, 0.40, 0.60, 0.5))
            },
            deadline: Some(|ctx| Some(ctx.today + Duration::days(14))),
            warnings: Some(|_| {
                vec!["Collection activity can escalate; respond promptly".to_string()]
            }),
        },
    ]
}

fn hospital_balance(ctx: &RuleContext) -> f64 {
    ctx.profile
        .bills
        .iter()
        .filter(|b| b.is_unpaid() && b.provider_type.offers_charity_care())
        .map(|b| b.patient_responsibility)
        .sum()
}

//! Bill analysis: billing error detection (duplicates, unbundling,
//! preventive miscoding, balance billing, overcharges), negotiation
//! opportunities, and itemization triggers.
//!
//! A malformed bill is skipped and recorded rather than failing the whole
//! run; detection proceeds over the remaining bills.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::{Bill, BillStatus, FinancialProfile, NetworkStatus};

use super::income::IncomeFinding;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillsFinding {
    pub bills_analyzed: usize,
    /// Bills that could not be analyzed, with the reason each was skipped.
    pub failed_bills: Vec<SkippedBill>,
    pub issues: Vec<BillingIssue>,
    pub negotiations: Vec<NegotiationOpportunity>,
    /// Bills large enough that a summary statement warrants an itemized
    /// bill request before payment.
    pub itemization_candidates: Vec<String>,
    pub total_billed: f64,
    pub total_patient_responsibility: f64,
    /// Recoverable via error disputes (duplicates, unbundling, overcharge).
    pub error_savings: f64,
    /// Recoverable via coverage disputes (preventive, balance billing).
    pub dispute_savings: f64,
    /// Expected value of negotiation opportunities.
    pub negotiation_savings: f64,
    pub confidence: f64,
    pub limitations: Vec<String>,
}

impl BillsFinding {
    pub fn degraded(reason: &str) -> Self {
        Self {
            bills_analyzed: 0,
            failed_bills: vec![],
            issues: vec![],
            negotiations: vec![],
            itemization_candidates: vec![],
            total_billed: 0.0,
            total_patient_responsibility: 0.0,
            error_savings: 0.0,
            dispute_savings: 0.0,
            negotiation_savings: 0.0,
            confidence: 0.1,
            limitations: vec![reason.to_string()],
        }
    }

    pub fn issues_of_kind(&self, kind: BillingIssueKind) -> impl Iterator<Item = &BillingIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn negotiations_of(
        &self,
        strategy: NegotiationStrategy,
    ) -> impl Iterator<Item = &NegotiationOpportunity> {
        self.negotiations
            .iter()
            .filter(move |n| n.strategy == strategy)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedBill {
    pub bill_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingIssueKind {
    DuplicateCharge,
    Unbundling,
    PreventiveCostShare,
    BalanceBilling,
    Overcharge,
}

impl BillingIssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingIssueKind::DuplicateCharge => "duplicate_charge",
            BillingIssueKind::Unbundling => "unbundling",
            BillingIssueKind::PreventiveCostShare => "preventive_cost_share",
            BillingIssueKind::BalanceBilling => "balance_billing",
            BillingIssueKind::Overcharge => "overcharge",
        }
    }
}

impl fmt::Display for BillingIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One detected billing problem on one bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingIssue {
    pub bill_id: String,
    pub kind: BillingIssueKind,
    pub description: String,
    /// Dollar amount in question.
    pub amount: f64,
    /// Detection confidence, 0.0-1.0.
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStrategy {
    PromptPay,
    HardshipDiscount,
    CashPay,
}

impl NegotiationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationStrategy::PromptPay => "prompt_pay",
            NegotiationStrategy::HardshipDiscount => "hardship_discount",
            NegotiationStrategy::CashPay => "cash_pay",
        }
    }
}

impl fmt::Display for NegotiationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationOpportunity {
    pub bill_id: String,
    pub strategy: NegotiationStrategy,
    /// Typical discount fraction for this strategy.
    pub expected_discount: f64,
    pub expected_savings: f64,
    pub confidence: f64,
}

/// Analyze all bills on the profile.
pub fn analyze(
    profile: &FinancialProfile,
    income: &IncomeFinding,
    config: &EngineConfig,
    today: NaiveDate,
) -> Result<BillsFinding> {
    let mut finding = BillsFinding {
        bills_analyzed: 0,
        failed_bills: vec![],
        issues: vec![],
        negotiations: vec![],
        itemization_candidates: vec![],
        total_billed: 0.0,
        total_patient_responsibility: 0.0,
        error_savings: 0.0,
        dispute_savings: 0.0,
        negotiation_savings: 0.0,
        confidence: 0.85,
        limitations: vec![],
    };

    if profile.bills.is_empty() {
        finding.confidence = 0.5;
        finding
            .limitations
            .push("No bills provided; billing analysis is empty".to_string());
        return Ok(finding);
    }

    let has_insurance = profile.insurance.is_some();
    let coinsurance = profile
        .insurance
        .as_ref()
        .map(|i| i.coinsurance)
        .unwrap_or(0.0);
    let mut any_missing_codes = false;

    for bill in &profile.bills {
        if let Some(reason) = bill_data_problem(bill) {
            tracing::warn!(bill_id = %bill.id, %reason, "skipping malformed bill");
            finding.failed_bills.push(SkippedBill {
                bill_id: bill.id.clone(),
                reason,
            });
            continue;
        }

        finding.bills_analyzed += 1;
        finding.total_billed += bill.total_amount;
        if bill.status != BillStatus::Paid {
            finding.total_patient_responsibility += bill.patient_responsibility;
        }
        if bill
            .line_items
            .iter()
            .any(|li| li.procedure_code.is_none())
        {
            any_missing_codes = true;
        }

        detect_duplicates(bill, &mut finding.issues);
        detect_unbundling(bill, config, &mut finding.issues);
        detect_preventive_cost_share(bill, config, &mut finding.issues);
        detect_balance_billing(bill, coinsurance, &mut finding.issues);
        detect_overcharges(bill, config, &mut finding.issues);

        if bill.is_unpaid() {
            collect_negotiations(
                bill,
                income,
                config,
                has_insurance,
                today,
                &mut finding.negotiations,
            );
            if bill.patient_responsibility > config.itemization_threshold
                && bill.line_items.len() < 5
            {
                finding.itemization_candidates.push(bill.id.clone());
            }
        }
    }

    for issue in &finding.issues {
        match issue.kind {
            BillingIssueKind::DuplicateCharge
            | BillingIssueKind::Unbundling
            | BillingIssueKind::Overcharge => finding.error_savings += issue.amount,
            BillingIssueKind::PreventiveCostShare | BillingIssueKind::BalanceBilling => {
                finding.dispute_savings += issue.amount
            }
        }
    }
    finding.negotiation_savings = finding
        .negotiations
        .iter()
        .map(|n| n.expected_savings)
        .sum();

    if any_missing_codes {
        finding.limitations.push(
            "Some line items lack procedure codes; duplicate and unbundling checks are weaker"
                .to_string(),
        );
        finding.confidence -= 0.1;
    }
    if !finding.failed_bills.is_empty() {
        finding.limitations.push(format!(
            "{} bill(s) could not be analyzed",
            finding.failed_bills.len()
        ));
        finding.confidence -= 0.05 * finding.failed_bills.len() as f64;
    }
    finding.confidence = finding.confidence.clamp(0.3, 1.0);

    tracing::debug!(
        analyzed = finding.bills_analyzed,
        skipped = finding.failed_bills.len(),
        issues = finding.issues.len(),
        "bill analysis complete"
    );

    Ok(finding)
}

/// Returns why a bill cannot be analyzed, if anything disqualifies it.
fn bill_data_problem(bill: &Bill) -> Option<String> {
    if bill.total_amount < 0.0 {
        return Some("negative total amount".to_string());
    }
    if bill.patient_responsibility < 0.0 {
        return Some("negative patient responsibility".to_string());
    }
    if let Some(li) = bill.line_items.iter().find(|li| li.charge < 0.0) {
        return Some(format!("negative charge on line item '{}'", li.description));
    }
    if bill
        .line_items
        .iter()
        .any(|li| li.patient_responsibility.map(|p| p < 0.0).unwrap_or(false))
    {
        return Some("negative patient responsibility on a line item".to_string());
    }
    if !bill.line_items.is_empty() {
        let line_total: f64 = bill.line_items.iter().map(|li| li.charge).sum();
        if (line_total - bill.total_amount).abs() > 0.01 {
            return Some(format!(
                "line items sum to {:.2} but total amount is {:.2}",
                line_total, bill.total_amount
            ));
        }
    }
    if bill.patient_responsibility > bill.total_amount {
        return Some("patient responsibility exceeds total amount".to_string());
    }
    None
}

/// Identical (code, service date, amount) triples on one bill. Each
/// occurrence past the first is a duplicate.
fn detect_duplicates(bill: &Bill, issues: &mut Vec<BillingIssue>) {
    let mut groups: BTreeMap<(String, NaiveDate, i64), (usize, f64)> = BTreeMap::new();
    for li in &bill.line_items {
        let key = (
            li.procedure_code
                .clone()
                .unwrap_or_else(|| li.description.clone()),
            li.service_date.unwrap_or(bill.service_date),
            (li.charge * 100.0).round() as i64,
        );
        let entry = groups.entry(key).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 = li.charge;
    }

    for ((code, date, _), (count, charge)) in groups {
        if count > 1 {
            let extra = (count - 1) as f64 * charge;
            issues.push(BillingIssue {
                bill_id: bill.id.clone(),
                kind: BillingIssueKind::DuplicateCharge,
                description: format!(
                    "{} billed {} times for {} on {}",
                    code, count, bill.provider, date
                ),
                amount: extra,
                confidence: 0.95,
            });
        }
    }
}

/// A comprehensive code billed alongside its component codes.
fn detect_unbundling(bill: &Bill, config: &EngineConfig, issues: &mut Vec<BillingIssue>) {
    let codes: Vec<&str> = bill
        .line_items
        .iter()
        .filter_map(|li| li.procedure_code.as_deref())
        .collect();

    for (parent, children) in &config.bundling_rules {
        if !codes.iter().any(|c| *c == parent.as_str()) {
            continue;
        }
        let billed_children: Vec<&String> = children
            .iter()
            .filter(|child| codes.iter().any(|c| *c == child.as_str()))
            .collect();
        if billed_children.is_empty() {
            continue;
        }
        let amount: f64 = bill
            .line_items
            .iter()
            .filter(|li| {
                li.procedure_code
                    .as_deref()
                    .map(|c| billed_children.iter().any(|b| b.as_str() == c))
                    .unwrap_or(false)
            })
            .map(|li| li.charge)
            .sum();
        issues.push(BillingIssue {
            bill_id: bill.id.clone(),
            kind: BillingIssueKind::Unbundling,
            description: format!(
                "Code {} includes {}; billing both is unbundling",
                parent,
                billed_children
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            amount,
            confidence: 0.80,
        });
    }
}

/// ACA preventive services billed with patient cost share. Confidence is
/// higher when the full charge landed on the patient.
fn detect_preventive_cost_share(bill: &Bill, config: &EngineConfig, issues: &mut Vec<BillingIssue>) {
    for li in &bill.line_items {
        let Some(code) = li.procedure_code.as_deref() else {
            continue;
        };
        if !config.preventive_codes.contains(code) {
            continue;
        }
        let patient_share = li.patient_responsibility.unwrap_or(0.0);
        if patient_share <= 0.0 {
            continue;
        }
        let confidence = if li.charge > 0.0 && patient_share >= li.charge {
            0.85
        } else {
            0.70
        };
        issues.push(BillingIssue {
            bill_id: bill.id.clone(),
            kind: BillingIssueKind::PreventiveCostShare,
            description: format!(
                "Preventive service {} ({}) billed with ${:.2} patient cost share",
                code, li.description, patient_share
            ),
            amount: patient_share,
            confidence,
        });
    }
}

/// Emergency care at an out-of-network provider billed past the allowed
/// amount plus the patient's coinsurance share. Protected in most cases
/// under the No Surprises Act. A small gap over the benchmark is noise,
/// so anything under $50 is ignored.
fn detect_balance_billing(bill: &Bill, coinsurance: f64, issues: &mut Vec<BillingIssue>) {
    if !bill.is_emergency || bill.network_status != Some(NetworkStatus::OutOfNetwork) {
        return;
    }
    let any_allowed = bill.line_items.iter().any(|li| li.allowed_amount.is_some());
    let amount = if any_allowed {
        let over_benchmark: f64 = bill
            .line_items
            .iter()
            .filter_map(|li| {
                li.allowed_amount
                    .map(|a| (li.charge - a * (1.0 + coinsurance)).max(0.0))
            })
            .sum();
        if over_benchmark < 50.0 {
            return;
        }
        over_benchmark
    } else {
        // No EOB data to benchmark against; the whole patient balance is
        // in question.
        bill.patient_responsibility
    };
    if amount <= 0.0 {
        return;
    }
    issues.push(BillingIssue {
        bill_id: bill.id.clone(),
        kind: BillingIssueKind::BalanceBilling,
        description: format!(
            "Emergency out-of-network bill from {} appears balance billed",
            bill.provider
        ),
        amount,
        confidence: 0.75,
    });
}

/// Line charges far above the allowed amount.
fn detect_overcharges(bill: &Bill, config: &EngineConfig, issues: &mut Vec<BillingIssue>) {
    for li in &bill.line_items {
        let Some(allowed) = li.allowed_amount else {
            continue;
        };
        if allowed <= 0.0 || li.charge <= allowed * config.overcharge_ratio {
            continue;
        }
        issues.push(BillingIssue {
            bill_id: bill.id.clone(),
            kind: BillingIssueKind::Overcharge,
            description: format!(
                "'{}' charged ${:.2} against a ${:.2} allowed amount",
                li.description, li.charge, allowed
            ),
            amount: li.charge - allowed,
            confidence: 0.60,
        });
    }
}

fn collect_negotiations(
    bill: &Bill,
    income: &IncomeFinding,
    config: &EngineConfig,
    has_insurance: bool,
    today: NaiveDate,
    out: &mut Vec<NegotiationOpportunity>,
) {
    let balance = bill.patient_responsibility;

    let age_days = (today - bill.service_date).num_days();
    if (0..=config.recent_bill_days).contains(&age_days) && bill.status == BillStatus::Pending {
        out.push(NegotiationOpportunity {
            bill_id: bill.id.clone(),
            strategy: NegotiationStrategy::PromptPay,
            expected_discount: 0.20,
            expected_savings: balance * 0.20,
            confidence: 0.70,
        });
    }

    if income.fpl_percentage < 300.0 {
        let discount = if income.fpl_percentage < 200.0 {
            0.50
        } else {
            0.35
        };
        out.push(NegotiationOpportunity {
            bill_id: bill.id.clone(),
            strategy: NegotiationStrategy::HardshipDiscount,
            expected_discount: discount,
            expected_savings: balance * discount,
            confidence: 0.60,
        });
    } else if income.fpl_percentage < 400.0 {
        out.push(NegotiationOpportunity {
            bill_id: bill.id.clone(),
            strategy: NegotiationStrategy::HardshipDiscount,
            expected_discount: 0.20,
            expected_savings: balance * 0.20,
            confidence: 0.55,
        });
    }

    if !has_insurance {
        out.push(NegotiationOpportunity {
            bill_id: bill.id.clone(),
            strategy: NegotiationStrategy::CashPay,
            expected_discount: 0.40,
            expected_savings: balance * 0.40,
            confidence: 0.55,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::income;
    use crate::models::{InsuranceInfo, LineItem, ProviderType};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn line(code: &str, charge: f64) -> LineItem {
        LineItem {
            description: format!("service {}", code),
            procedure_code: Some(code.into()),
            charge,
            allowed_amount: None,
            service_date: None,
            patient_responsibility: None,
        }
    }

    fn bill(id: &str, lines: Vec<LineItem>) -> Bill {
        let total: f64 = lines.iter().map(|l| l.charge).sum();
        Bill {
            id: id.into(),
            provider: "General Hospital".into(),
            provider_type: ProviderType::Hospital,
            service_date: date("2025-05-01"),
            due_date: None,
            line_items: lines,
            total_amount: total,
            insurance_paid: None,
            patient_responsibility: total,
            status: BillStatus::Pending,
            network_status: Some(NetworkStatus::InNetwork),
            is_emergency: false,
            in_collections: false,
        }
    }

    fn profile(bills: Vec<Bill>) -> FinancialProfile {
        FinancialProfile {
            household_size: 1,
            annual_income: 80_000.0,
            monthly_expenses: 0.0,
            income_sources: vec![],
            debts: vec![],
            insurance: None,
            bills,
            state: None,
            employment_status: None,
            has_regular_prescriptions: false,
            has_chronic_condition: false,
        }
    }

    fn run(p: &FinancialProfile) -> BillsFinding {
        let cfg = EngineConfig::default();
        let inc = income::analyze(p, &cfg).unwrap();
        analyze(p, &inc, &cfg, date("2025-06-01")).unwrap()
    }

    #[test]
    fn duplicate_lines_produce_one_issue() {
        let p = profile(vec![bill(
            "b1",
            vec![line("80053", 150.0), line("80053", 150.0)],
        )]);
        let f = run(&p);
        let dups: Vec<_> = f.issues_of_kind(BillingIssueKind::DuplicateCharge).collect();
        assert_eq!(dups.len(), 1);
        assert!((dups[0].amount - 150.0).abs() < 0.01);
        assert!((dups[0].confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn distinct_dates_are_not_duplicates() {
        let mut a = line("99213", 120.0);
        a.service_date = Some(date("2025-05-01"));
        let mut b = line("99213", 120.0);
        b.service_date = Some(date("2025-05-08"));
        let p = profile(vec![bill("b1", vec![a, b])]);
        let f = run(&p);
        assert_eq!(f.issues_of_kind(BillingIssueKind::DuplicateCharge).count(), 0);
    }

    #[test]
    fn unbundled_panel_is_flagged() {
        let p = profile(vec![bill(
            "b1",
            vec![line("80053", 90.0), line("80048", 55.0)],
        )]);
        let f = run(&p);
        let issues: Vec<_> = f.issues_of_kind(BillingIssueKind::Unbundling).collect();
        assert_eq!(issues.len(), 1);
        assert!((issues[0].amount - 55.0).abs() < 0.01);
        assert!((issues[0].confidence - 0.80).abs() < f64::EPSILON);
    }

    #[test]
    fn preventive_with_full_cost_share_is_high_confidence() {
        let mut li = line("G0439", 250.0);
        li.patient_responsibility = Some(250.0);
        let p = profile(vec![bill("b1", vec![li])]);
        let f = run(&p);
        let issues: Vec<_> = f
            .issues_of_kind(BillingIssueKind::PreventiveCostShare)
            .collect();
        assert_eq!(issues.len(), 1);
        assert!((issues[0].confidence - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn emergency_oon_bill_is_balance_billing() {
        let mut li = line("99285", 3_000.0);
        li.allowed_amount = Some(1_200.0);
        let mut b = bill("er1", vec![li]);
        b.is_emergency = true;
        b.network_status = Some(NetworkStatus::OutOfNetwork);
        let p = profile(vec![b]);
        let f = run(&p);
        let issues: Vec<_> = f.issues_of_kind(BillingIssueKind::BalanceBilling).collect();
        assert_eq!(issues.len(), 1);
        assert!((issues[0].amount - 1_800.0).abs() < 0.01);
        assert!((issues[0].confidence - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn charges_inside_the_coinsurance_share_are_not_balance_billing() {
        let mut li = line("99284", 1_100.0);
        li.allowed_amount = Some(1_000.0);
        let mut b = bill("er1", vec![li]);
        b.is_emergency = true;
        b.network_status = Some(NetworkStatus::OutOfNetwork);
        let mut p = profile(vec![b]);
        p.insurance = Some(InsuranceInfo {
            deductible: 2_000.0,
            deductible_used: 0.0,
            oop_max: 8_000.0,
            oop_used: 0.0,
            coinsurance: 0.2,
            coverage_percentage: 0.8,
            network_status: NetworkStatus::InNetwork,
            plan_year_end: None,
        });
        // 1,100 is under the 1,000 * 1.2 benchmark.
        let f = run(&p);
        assert_eq!(f.issues_of_kind(BillingIssueKind::BalanceBilling).count(), 0);
    }

    #[test]
    fn overcharge_needs_to_clear_the_ratio() {
        let mut cheap = line("74150", 200.0);
        cheap.allowed_amount = Some(100.0); // 2x, under the 3x default
        let mut steep = line("74160", 700.0);
        steep.allowed_amount = Some(100.0); // 7x
        let p = profile(vec![bill("b1", vec![cheap, steep])]);
        let f = run(&p);
        let issues: Vec<_> = f.issues_of_kind(BillingIssueKind::Overcharge).collect();
        assert_eq!(issues.len(), 1);
        assert!((issues[0].amount - 600.0).abs() < 0.01);
    }

    #[test]
    fn malformed_bill_is_skipped_and_recorded() {
        let good = bill("good1", vec![line("80053", 150.0), line("80053", 150.0)]);
        let good2 = bill("good2", vec![line("99213", 120.0)]);
        let bad = bill("bad1", vec![line("99999", -50.0)]);
        let p = profile(vec![good, bad, good2]);
        let f = run(&p);
        assert_eq!(f.bills_analyzed, 2);
        assert_eq!(f.failed_bills.len(), 1);
        assert_eq!(f.failed_bills[0].bill_id, "bad1");
        // The surviving bills still get their issues detected.
        assert_eq!(f.issues_of_kind(BillingIssueKind::DuplicateCharge).count(), 1);
    }

    #[test]
    fn responsibility_above_total_is_skipped_and_recorded() {
        let mut b = bill("bad1", vec![line("99213", 300.0)]);
        b.patient_responsibility = 500.0;
        let p = profile(vec![b, bill("good1", vec![line("80053", 150.0)])]);
        let f = run(&p);
        assert_eq!(f.bills_analyzed, 1);
        assert_eq!(f.failed_bills.len(), 1);
        assert_eq!(f.failed_bills[0].bill_id, "bad1");
    }

    #[test]
    fn total_that_disagrees_with_line_items_is_skipped() {
        let mut b = bill("bad1", vec![line("99213", 120.0), line("80053", 80.0)]);
        b.total_amount = 450.0;
        let p = profile(vec![b]);
        let f = run(&p);
        assert_eq!(f.bills_analyzed, 0);
        assert_eq!(f.failed_bills.len(), 1);
        assert!(f.failed_bills[0].reason.contains("line items sum"));
    }

    #[test]
    fn uninsured_bill_gets_cash_pay_option() {
        let p = profile(vec![bill("b1", vec![line("99213", 400.0)])]);
        let f = run(&p);
        assert!(f
            .negotiations_of(NegotiationStrategy::CashPay)
            .next()
            .is_some());
    }

    #[test]
    fn low_income_gets_the_deep_hardship_band() {
        let mut p = profile(vec![bill("b1", vec![line("99213", 1_000.0)])]);
        p.annual_income = 25_000.0; // ~166% FPL for household of 1
        let f = run(&p);
        let n = f
            .negotiations_of(NegotiationStrategy::HardshipDiscount)
            .next()
            .unwrap();
        assert!((n.expected_discount - 0.50).abs() < f64::EPSILON);
        assert!((n.expected_savings - 500.0).abs() < 0.01);
    }

    #[test]
    fn large_summary_bill_triggers_itemization() {
        let b = Bill {
            line_items: vec![line("UNKNOWN", 2_400.0)],
            total_amount: 2_400.0,
            patient_responsibility: 2_400.0,
            ..bill("b1", vec![])
        };
        let p = profile(vec![b]);
        let f = run(&p);
        assert_eq!(f.itemization_candidates, vec!["b1".to_string()]);
    }

    #[test]
    fn savings_rollups_split_by_category() {
        let mut prev = line("G0439", 250.0);
        prev.patient_responsibility = Some(250.0);
        let p = profile(vec![bill(
            "b1",
            vec![line("80053", 150.0), line("80053", 150.0), prev],
        )]);
        let f = run(&p);
        assert!((f.error_savings - 150.0).abs() < 0.01);
        assert!((f.dispute_savings - 250.0).abs() < 0.01);
    }
}

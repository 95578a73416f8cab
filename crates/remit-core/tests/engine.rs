//! End-to-end pipeline tests: profile in, navigation plan out.

use chrono::NaiveDate;
use remit_core::{
    ActionCategory, Bill, BillStatus, DebtAccount, DebtStatus, Engine, EngineConfig, Error,
    FinancialProfile, InsuranceInfo, LineItem, NetworkStatus, Priority, ProviderType, RiskCategory,
    Rule, SavingsEstimate,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn today() -> NaiveDate {
    date("2025-06-01")
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

fn bill(id: &str, provider_type: ProviderType, lines: Vec<LineItem>) -> Bill {
    let total: f64 = lines.iter().map(|l| l.charge).sum();
    Bill {
        id: id.into(),
        provider: "Mercy General".into(),
        provider_type,
        service_date: date("2025-05-10"),
        due_date: Some(date("2025-07-10")),
        line_items: lines,
        total_amount: total,
        insurance_paid: None,
        patient_responsibility: total,
        status: BillStatus::Pending,
        network_status: None,
        is_emergency: false,
        in_collections: false,
    }
}

fn profile(household_size: u32, annual_income: f64) -> FinancialProfile {
    FinancialProfile {
        household_size,
        annual_income,
        monthly_expenses: 1_200.0,
        income_sources: vec![],
        debts: vec![],
        insurance: None,
        bills: vec![],
        state: Some("WA".into()),
        employment_status: None,
        has_regular_prescriptions: false,
        has_chronic_condition: false,
    }
}

#[test]
fn low_income_household_is_steered_to_assistance() {
    let mut p = profile(2, 20_000.0);
    p.bills
        .push(bill("er-visit", ProviderType::Hospital, vec![line("99285", 8_500.0)]));

    let engine = Engine::default();
    let plan = engine.generate_plan(&p, today()).unwrap();

    // Just under the poverty line for a household of two.
    assert!(plan.findings.income.fpl_percentage < 100.0);
    assert!(plan.findings.income.likely_charity_care_eligible);

    let charity = plan
        .recommendations
        .iter()
        .find(|r| r.recommendation.rule_id == "R007")
        .expect("charity care should fire for a poverty-level hospital bill");
    assert_eq!(charity.recommendation.category, ActionCategory::Assistance);
    // Full write-off expected below 100% FPL.
    assert!((charity.recommendation.savings.expected - 8_500.0).abs() < 0.01);
}

#[test]
fn duplicate_charges_surface_as_issue_and_dispute() {
    let mut p = profile(1, 90_000.0);
    p.bills.push(bill(
        "lab",
        ProviderType::Lab,
        vec![line("80053", 150.0), line("80053", 150.0)],
    ));

    let plan = Engine::default().generate_plan(&p, today()).unwrap();

    assert_eq!(plan.findings.bills.issues.len(), 1);
    let issue = &plan.findings.bills.issues[0];
    assert!((issue.amount - 150.0).abs() < 0.01);
    assert!((issue.confidence - 0.95).abs() < 0.01);

    let dispute = plan
        .recommendations
        .iter()
        .find(|r| r.recommendation.rule_id == "R001")
        .unwrap();
    assert!((dispute.recommendation.savings.expected - 142.5).abs() < 0.01);
}

#[test]
fn uninsured_profile_degrades_gracefully() {
    let mut p = profile(1, 45_000.0);
    p.bills
        .push(bill("clinic", ProviderType::Physician, vec![line("99214", 650.0)]));

    let plan = Engine::default().generate_plan(&p, today()).unwrap();

    assert!(!plan.findings.insurance.has_coverage);
    assert!(plan.findings.insurance.confidence < 0.5);
    assert!(plan
        .recommendations
        .iter()
        .any(|r| r.recommendation.rule_id == "R011"));
}

#[test]
fn malformed_bill_is_skipped_not_fatal() {
    let mut p = profile(1, 60_000.0);
    p.bills
        .push(bill("good-1", ProviderType::Physician, vec![line("99213", 120.0)]));
    let mut bad = bill("bad-1", ProviderType::Lab, vec![line("85025", 60.0)]);
    bad.patient_responsibility = -50.0;
    p.bills.push(bad);
    p.bills
        .push(bill("good-2", ProviderType::Imaging, vec![line("77067", 300.0)]));

    let plan = Engine::default().generate_plan(&p, today()).unwrap();

    assert_eq!(plan.findings.bills.bills_analyzed, 2);
    assert_eq!(plan.findings.bills.failed_bills.len(), 1);
    assert_eq!(plan.findings.bills.failed_bills[0].bill_id, "bad-1");
}

#[test]
fn ranking_is_dense_and_monotonic() {
    let mut p = profile(3, 35_000.0);
    p.insurance = Some(InsuranceInfo {
        deductible: 3_000.0,
        deductible_used: 500.0,
        oop_max: 8_000.0,
        oop_used: 500.0,
        coinsurance: 0.2,
        coverage_percentage: 0.8,
        network_status: NetworkStatus::InNetwork,
        plan_year_end: None,
    });
    p.debts.push(DebtAccount {
        name: "old er bill".into(),
        balance: 4_000.0,
        monthly_payment: 0.0,
        is_medical: true,
        is_secured: false,
        status: DebtStatus::Collections,
    });
    p.bills.push(bill(
        "hospital",
        ProviderType::Hospital,
        vec![line("99285", 6_000.0), line("99285", 6_000.0)],
    ));

    let plan = Engine::default().generate_plan(&p, today()).unwrap();
    assert!(plan.recommendations.len() >= 3);

    for (i, rec) in plan.recommendations.iter().enumerate() {
        assert_eq!(rec.final_rank, i + 1);
    }
    for pair in plan.recommendations.windows(2) {
        assert!(pair[0].composite_score >= pair[1].composite_score);
    }
}

#[test]
fn every_recommendation_appears_in_exactly_one_bucket() {
    let mut p = profile(2, 28_000.0);
    p.bills.push(bill(
        "hospital",
        ProviderType::Hospital,
        vec![line("80053", 900.0), line("80048", 400.0)],
    ));
    p.debts.push(DebtAccount {
        name: "card".into(),
        balance: 3_000.0,
        monthly_payment: 90.0,
        is_medical: false,
        is_secured: false,
        status: DebtStatus::PastDue,
    });

    let plan = Engine::default().generate_plan(&p, today()).unwrap();
    assert_eq!(plan.plan.len(), plan.recommendations.len());

    let mut ids: Vec<&str> = plan
        .plan
        .immediate
        .iter()
        .chain(&plan.plan.this_week)
        .chain(&plan.plan.this_month)
        .chain(&plan.plan.ongoing)
        .map(|s| s.rule_id.as_str())
        .collect();
    ids.sort_unstable();
    let mut expected: Vec<&str> = plan
        .recommendations
        .iter()
        .map(|r| r.recommendation.rule_id.as_str())
        .collect();
    expected.sort_unstable();
    assert_eq!(ids, expected);
}

#[test]
fn total_savings_bounds_are_ordered() {
    let mut p = profile(1, 25_000.0);
    p.bills.push(bill(
        "hospital",
        ProviderType::Hospital,
        vec![line("99284", 2_500.0), line("99284", 2_500.0)],
    ));

    let plan = Engine::default().generate_plan(&p, today()).unwrap();
    let s = &plan.total_savings;
    assert!(s.minimum <= s.expected);
    assert!(s.expected <= s.maximum);
    assert!(s.confidence > 0.0 && s.confidence <= 1.0);
    assert!(plan.total_risk_reduction <= plan.risk.overall_score);
}

#[test]
fn identical_inputs_produce_identical_plans() {
    let mut p = profile(2, 32_000.0);
    p.bills.push(bill(
        "hospital",
        ProviderType::Hospital,
        vec![line("43239", 1_800.0), line("43235", 700.0)],
    ));
    p.debts.push(DebtAccount {
        name: "loan".into(),
        balance: 9_000.0,
        monthly_payment: 250.0,
        is_medical: false,
        is_secured: true,
        status: DebtStatus::Current,
    });

    let engine = Engine::default();
    let a = serde_json::to_string(&engine.generate_plan(&p, today()).unwrap()).unwrap();
    let b = serde_json::to_string(&engine.generate_plan(&p, today()).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn failing_custom_rule_is_recorded_and_skipped() {
    let catalog = vec![Rule {
        id: "X001",
        name: "Unestimable Action",
        description: "Savings math always fails",
        category: ActionCategory::Verification,
        base_priority: Priority::Low,
        effort_minutes: 10,
        success_probability: 0.5,
        risk_reduction: 2.0,
        required_documents: &[],
        action_steps: &[],
        condition: |_| true,
        savings: |_| Err(Error::Rule("no basis for an estimate".into())),
        deadline: None,
        warnings: None,
    }];

    let engine = Engine::with_catalog(EngineConfig::default(), catalog).unwrap();
    let plan = engine.generate_plan(&profile(1, 50_000.0), today()).unwrap();

    assert!(plan.recommendations.is_empty());
    assert_eq!(plan.skipped_rules.len(), 1);
    assert_eq!(plan.skipped_rules[0].rule_id, "X001");
    // An empty plan still carries the neutral savings estimate.
    assert!((plan.total_savings.confidence - 0.5).abs() < f64::EPSILON);
}

#[test]
fn invalid_profile_is_a_hard_error() {
    let mut p = profile(1, 50_000.0);
    p.annual_income = -1.0;
    let err = Engine::default().generate_plan(&p, today()).unwrap_err();
    assert!(matches!(err, Error::InvalidProfile(_)));
}

#[test]
fn deep_trouble_scores_worse_than_smooth_sailing() {
    let mut struggling = profile(4, 22_000.0);
    struggling.monthly_expenses = 2_400.0;
    struggling.debts.push(DebtAccount {
        name: "er".into(),
        balance: 18_000.0,
        monthly_payment: 300.0,
        is_medical: true,
        is_secured: false,
        status: DebtStatus::Collections,
    });
    struggling.bills.push(bill(
        "hospital",
        ProviderType::Hospital,
        vec![line("99285", 12_000.0)],
    ));

    let mut comfortable = profile(2, 180_000.0);
    comfortable.insurance = Some(InsuranceInfo {
        deductible: 1_500.0,
        deductible_used: 1_500.0,
        oop_max: 5_000.0,
        oop_used: 4_800.0,
        coinsurance: 0.1,
        coverage_percentage: 0.9,
        network_status: NetworkStatus::InNetwork,
        plan_year_end: None,
    });

    let engine = Engine::default();
    let bad = engine.generate_plan(&struggling, today()).unwrap();
    let good = engine.generate_plan(&comfortable, today()).unwrap();

    assert!(bad.risk.overall_score > good.risk.overall_score);
    assert!(bad.risk.category >= RiskCategory::High);
    assert!(good.risk.category <= RiskCategory::Moderate);
}

#[test]
fn executive_summary_reflects_the_numbers() {
    let mut p = profile(1, 40_000.0);
    p.bills.push(bill(
        "lab",
        ProviderType::Lab,
        vec![line("85025", 90.0), line("85025", 90.0)],
    ));

    let plan = Engine::default().generate_plan(&p, today()).unwrap();
    assert!(plan.executive_summary.contains("1 medical bill(s)"));
    assert!(!plan.key_takeaways.is_empty());
    assert!(plan.key_takeaways.len() <= 5);
    assert_eq!(plan.generated, today());
    assert_eq!(plan.valid_until, date("2025-07-01"));
}

#[test]
fn savings_estimate_serializes_with_snake_case_fields() {
    let s = SavingsEstimate {
        minimum: 1.0,
        expected: 2.0,
        maximum: 3.0,
        confidence: 0.5,
    };
    let json = serde_json::to_value(&s).unwrap();
    assert!(json.get("expected").is_some());
    assert!(json.get("confidence").is_some());
}

//! Command implementations for the remit CLI.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use remit_core::{
    Engine, EngineConfig, FinancialProfile, NavigationPlanResponse, RankedRecommendation,
};

pub fn load_profile(path: &Path) -> Result<FinancialProfile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile file: {}", path.display()))?;
    let profile: FinancialProfile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse profile JSON: {}", path.display()))?;
    Ok(profile)
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load(p)
            .with_context(|| format!("Failed to load config: {}", p.display())),
        None => Ok(EngineConfig::default()),
    }
}

pub fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid --date '{}' (use YYYY-MM-DD)", s)),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn build_plan(
    profile_path: &Path,
    config_path: Option<&Path>,
    date: Option<&str>,
) -> Result<NavigationPlanResponse> {
    let profile = load_profile(profile_path)?;
    let config = load_config(config_path)?;
    let today = resolve_date(date)?;
    tracing::debug!(
        profile = %profile_path.display(),
        %today,
        "running analysis"
    );
    let engine = Engine::new(config)?;
    Ok(engine.generate_plan(&profile, today)?)
}

pub fn cmd_plan(
    profile_path: &Path,
    config_path: Option<&Path>,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let plan = build_plan(profile_path, config_path, date)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

pub fn cmd_risk(
    profile_path: &Path,
    config_path: Option<&Path>,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let plan = build_plan(profile_path, config_path, date)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan.risk)?);
        return Ok(());
    }

    println!(
        "Risk: {:.0}/100 ({})",
        plan.risk.overall_score, plan.risk.category
    );
    for dim in &plan.risk.dimensions {
        println!(
            "  {:<10} {:>5.1}  (weight {:.2})",
            dim.dimension, dim.score, dim.weight
        );
        for driver in &dim.drivers {
            println!("             - {}", driver);
        }
    }
    if !plan.risk.alerts.is_empty() {
        println!("\nAlerts:");
        for alert in &plan.risk.alerts {
            println!("  ! {}", alert);
        }
    }
    Ok(())
}

pub fn cmd_bills(
    profile_path: &Path,
    config_path: Option<&Path>,
    date: Option<&str>,
    json: bool,
) -> Result<()> {
    let plan = build_plan(profile_path, config_path, date)?;
    let bills = &plan.findings.bills;
    if json {
        println!("{}", serde_json::to_string_pretty(bills)?);
        return Ok(());
    }

    println!(
        "Analyzed {} bill(s); patient responsibility ${:.2}",
        bills.bills_analyzed, bills.total_patient_responsibility
    );
    if bills.issues.is_empty() {
        println!("No billing issues found.");
    } else {
        println!("\nIssues:");
        for issue in &bills.issues {
            println!(
                "  [{}] {}: ${:.2} ({:.0}% confidence)",
                issue.bill_id,
                issue.kind,
                issue.amount,
                issue.confidence * 100.0
            );
            println!("      {}", issue.description);
        }
    }
    if !bills.negotiations.is_empty() {
        println!("\nNegotiation opportunities:");
        for n in &bills.negotiations {
            println!(
                "  [{}] {}: ~${:.2} savings at {:.0}% discount",
                n.bill_id,
                n.strategy,
                n.expected_savings,
                n.expected_discount * 100.0
            );
        }
    }
    for skipped in &bills.failed_bills {
        println!("\nSkipped bill {}: {}", skipped.bill_id, skipped.reason);
    }
    Ok(())
}

pub fn cmd_validate(profile_path: &Path) -> Result<()> {
    let profile = load_profile(profile_path)?;
    profile.validate()?;
    println!(
        "Profile OK: household of {}, {} bill(s), {} debt account(s), {}",
        profile.household_size,
        profile.bills.len(),
        profile.debts.len(),
        if profile.insurance.is_some() {
            "insured"
        } else {
            "uninsured"
        }
    );
    Ok(())
}

fn print_plan(plan: &NavigationPlanResponse) {
    println!("{}", plan.executive_summary);
    println!(
        "\nRisk: {:.0}/100 ({})   Expected savings: ${:.2}   Confidence: {:.0}%",
        plan.risk.overall_score,
        plan.risk.category,
        plan.total_savings.expected,
        plan.confidence * 100.0
    );

    if !plan.key_takeaways.is_empty() {
        println!("\nKey takeaways:");
        for takeaway in &plan.key_takeaways {
            println!("  * {}", takeaway);
        }
    }

    print_bucket("Do now", &plan.plan.immediate, &plan.recommendations);
    print_bucket("This week", &plan.plan.this_week, &plan.recommendations);
    print_bucket("This month", &plan.plan.this_month, &plan.recommendations);
    print_bucket("Ongoing", &plan.plan.ongoing, &plan.recommendations);

    if !plan.skipped_rules.is_empty() {
        println!("\nSkipped checks:");
        for skipped in &plan.skipped_rules {
            println!("  - {}: {}", skipped.rule_id, skipped.reason);
        }
    }
}

fn print_bucket(
    label: &str,
    steps: &[remit_core::PlanStep],
    recommendations: &[RankedRecommendation],
) {
    if steps.is_empty() {
        return;
    }
    println!("\n{}:", label);
    for step in steps {
        let rec = recommendations
            .iter()
            .find(|r| r.recommendation.rule_id == step.rule_id);
        match rec {
            Some(rec) => {
                print!(
                    "  {}. [{}] {}",
                    step.final_rank, rec.recommendation.priority, step.title
                );
                if rec.recommendation.savings.expected > 0.0 {
                    print!(" (~${:.0})", rec.recommendation.savings.expected);
                }
                if let Some(deadline) = step.deadline {
                    print!(" due {}", deadline);
                }
                println!();
                println!("     {}", rec.rationale);
            }
            None => println!("  {}. {}", step.final_rank, step.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_PROFILE: &str = r#"{
        "household_size": 2,
        "annual_income": 36000,
        "monthly_expenses": 1800,
        "bills": [
            {
                "id": "b1",
                "provider": "Mercy General",
                "provider_type": "hospital",
                "service_date": "2025-05-01",
                "line_items": [
                    {"description": "metabolic panel", "procedure_code": "80053", "charge": 150.0},
                    {"description": "metabolic panel", "procedure_code": "80053", "charge": 150.0}
                ],
                "total_amount": 300.0,
                "patient_responsibility": 300.0
            }
        ]
    }"#;

    fn write_file(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn profile_loads_from_json() {
        let f = write_file(MINIMAL_PROFILE);
        let profile = load_profile(f.path()).unwrap();
        assert_eq!(profile.household_size, 2);
        assert_eq!(profile.bills.len(), 1);
        assert_eq!(profile.bills[0].line_items.len(), 2);
    }

    #[test]
    fn bad_json_gives_a_parse_error() {
        let f = write_file("{not json");
        let err = load_profile(f.path()).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let config = load_config(None).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_loads_from_toml() {
        let f = write_file("affordability_fraction = 0.15\n");
        let config = load_config(Some(f.path())).unwrap();
        assert!((config.affordability_fraction - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn date_flag_parses_or_errors() {
        assert_eq!(
            resolve_date(Some("2025-06-01")).unwrap(),
            NaiveDate::parse_from_str("2025-06-01", "%Y-%m-%d").unwrap()
        );
        assert!(resolve_date(Some("06/01/2025")).is_err());
    }

    #[test]
    fn plan_command_runs_end_to_end() {
        let f = write_file(MINIMAL_PROFILE);
        cmd_plan(f.path(), None, Some("2025-06-01"), false).unwrap();
        cmd_plan(f.path(), None, Some("2025-06-01"), true).unwrap();
    }

    #[test]
    fn validate_rejects_a_broken_profile() {
        let f = write_file(r#"{"household_size": 0, "annual_income": 100}"#);
        assert!(cmd_validate(f.path()).is_err());
    }
}

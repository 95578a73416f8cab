//! The top-level engine: validate, analyze, assess, evaluate, rank,
//! assemble. Pure and synchronous; the caller supplies the date so a
//! given profile always produces the same plan.

use chrono::NaiveDate;

use crate::analyzers;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::models::FinancialProfile;
use crate::plan::{self, NavigationPlanResponse};
use crate::ranking;
use crate::risk;
use crate::rules::{self, Rule, RuleContext};

pub struct Engine {
    config: EngineConfig,
    catalog: Vec<Rule>,
}

impl Engine {
    /// Engine with the built-in rule catalog.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            catalog: rules::default_catalog(),
        })
    }

    /// Engine with a caller-supplied catalog.
    pub fn with_catalog(config: EngineConfig, catalog: Vec<Rule>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, catalog })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline for one profile.
    pub fn generate_plan(
        &self,
        profile: &FinancialProfile,
        today: NaiveDate,
    ) -> Result<NavigationPlanResponse> {
        profile.validate()?;

        tracing::debug!(
            bills = profile.bills.len(),
            debts = profile.debts.len(),
            insured = profile.insurance.is_some(),
            "generating plan"
        );

        let findings = analyzers::run_all(profile, &self.config, today);
        let risk = risk::assess(profile, &findings, &self.config);

        let ctx = RuleContext {
            profile,
            config: &self.config,
            today,
            findings: &findings,
            risk: &risk,
        };
        let (recommendations, skipped_rules) = rules::evaluate(&self.catalog, &ctx);
        let ranked = ranking::rank(
            recommendations,
            &risk,
            &self.config.ranking_weights,
            today,
        );

        Ok(plan::assemble(
            profile,
            today,
            findings,
            risk,
            ranked,
            skipped_rules,
        ))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            catalog: rules::default_catalog(),
        }
    }
}

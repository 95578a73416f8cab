//! Engine configuration.
//!
//! Every numeric business constant the engine uses lives here so
//! deployments can track guideline updates (poverty thresholds, payer
//! rules) without a code change. A configuration file is TOML; missing
//! sections fall back to the built-in defaults, so a file that only sets
//! `[fpl]` still gets the full weight tables.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{Error, Result};

/// Federal poverty guideline parameters.
///
/// `threshold = base + per_person_increment * (household_size - 1)`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FplConfig {
    pub base: f64,
    pub per_person_increment: f64,
    /// True when the built-in table is in use rather than a deployment-
    /// provided one. Analyzers lower their confidence slightly in that
    /// case since guidelines change yearly. Any `[fpl]` section in a
    /// configuration file clears this.
    #[serde(skip, default = "deserialized_fpl_marker")]
    pub built_in: bool,
}

fn deserialized_fpl_marker() -> bool {
    false
}

impl Default for FplConfig {
    fn default() -> Self {
        // 2024 HHS guidelines for the 48 contiguous states.
        Self {
            base: 15_060.0,
            per_person_increment: 5_380.0,
            built_in: true,
        }
    }
}

impl FplConfig {
    /// Poverty threshold for a household of the given size.
    pub fn threshold(&self, household_size: u32) -> f64 {
        self.base + self.per_person_increment * (household_size.saturating_sub(1) as f64)
    }
}

/// Weights for combining the four risk dimensions into an overall score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    pub income: f64,
    pub debt: f64,
    pub insurance: f64,
    pub billing: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            income: 0.30,
            debt: 0.30,
            insurance: 0.20,
            billing: 0.20,
        }
    }
}

impl RiskWeights {
    pub fn total(&self) -> f64 {
        self.income + self.debt + self.insurance + self.billing
    }
}

/// Weights for the five ranking factors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingWeights {
    pub savings: f64,
    pub urgency: f64,
    pub success: f64,
    pub ease: f64,
    pub risk_reduction: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            savings: 0.30,
            urgency: 0.25,
            success: 0.20,
            ease: 0.15,
            risk_reduction: 0.10,
        }
    }
}

impl RankingWeights {
    pub fn total(&self) -> f64 {
        self.savings + self.urgency + self.success + self.ease + self.risk_reduction
    }
}

/// All tunable engine parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fpl: FplConfig,
    /// Fraction of monthly income considered sustainable for medical
    /// payments.
    pub affordability_fraction: f64,
    /// A line charge above this multiple of the allowed amount is flagged
    /// as a probable overcharge.
    pub overcharge_ratio: f64,
    /// Bills with a service date within this many days of the analysis
    /// date qualify for prompt-pay negotiation.
    pub recent_bill_days: i64,
    /// Unpaid balance above which a summary bill (few line items) triggers
    /// an itemization request.
    pub itemization_threshold: f64,
    pub risk_weights: RiskWeights,
    pub ranking_weights: RankingWeights,
    /// Procedure codes that include the listed component codes; billing
    /// both on one bill is unbundling. Simplified NCCI subset.
    pub bundling_rules: BTreeMap<String, Vec<String>>,
    /// ACA preventive-care codes that should carry no patient cost share.
    pub preventive_codes: BTreeSet<String>,
    /// Weighted dimension score above which a dimension is called out as a
    /// critical risk factor.
    pub critical_factor_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fpl: FplConfig::default(),
            affordability_fraction: 0.10,
            overcharge_ratio: 3.0,
            recent_bill_days: 90,
            itemization_threshold: 500.0,
            risk_weights: RiskWeights::default(),
            ranking_weights: RankingWeights::default(),
            bundling_rules: default_bundling_rules(),
            preventive_codes: default_preventive_codes(),
            critical_factor_threshold: 18.0,
        }
    }
}

fn default_bundling_rules() -> BTreeMap<String, Vec<String>> {
    let mut rules = BTreeMap::new();
    let insert = |rules: &mut BTreeMap<String, Vec<String>>, parent: &str, children: &[&str]| {
        rules.insert(
            parent.to_string(),
            children.iter().map(|c| c.to_string()).collect(),
        );
    };
    // Office visit levels
    insert(&mut rules, "99214", &["99211", "99212", "99213"]);
    // Upper GI endoscopy with biopsy includes the diagnostic study
    insert(&mut rules, "43239", &["43235"]);
    // Knee arthroscopy with meniscectomy includes the diagnostic scope
    insert(&mut rules, "29881", &["29880"]);
    // Comprehensive metabolic panel includes the basic panel
    insert(&mut rules, "80053", &["80048"]);
    // CBC with differential includes CBC without
    insert(&mut rules, "85025", &["85027"]);
    rules
}

fn default_preventive_codes() -> BTreeSet<String> {
    [
        // Preventive visits, new and established patients
        "99381", "99382", "99383", "99384", "99385", "99386", "99387", "99391", "99392", "99393",
        "99394", "99395", "99396", "99397",
        // Annual wellness visit / Welcome to Medicare
        "G0438", "G0439", "G0402",
        // Screening mammogram
        "77067",
        // Cervical and pelvic screening
        "G0101", "G0123", "G0124",
        // Colorectal screening
        "82270", "G0104", "G0105", "G0121",
        // Routine venipuncture
        "36415",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

impl EngineConfig {
    /// Parse a TOML configuration string. Missing sections keep their
    /// defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fpl.base <= 0.0 || self.fpl.per_person_increment < 0.0 {
            return Err(Error::Config(
                "fpl.base must be positive and fpl.per_person_increment non-negative".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.affordability_fraction) {
            return Err(Error::Config(
                "affordability_fraction must be between 0 and 1".into(),
            ));
        }
        if self.overcharge_ratio < 1.0 {
            return Err(Error::Config("overcharge_ratio must be at least 1".into()));
        }
        let rw = &self.risk_weights;
        if [rw.income, rw.debt, rw.insurance, rw.billing]
            .iter()
            .any(|w| *w < 0.0)
            || rw.total() <= 0.0
        {
            return Err(Error::Config(
                "risk weights must be non-negative and sum to a positive total".into(),
            ));
        }
        let kw = &self.ranking_weights;
        if [kw.savings, kw.urgency, kw.success, kw.ease, kw.risk_reduction]
            .iter()
            .any(|w| *w < 0.0)
            || kw.total() <= 0.0
        {
            return Err(Error::Config(
                "ranking weights must be non-negative and sum to a positive total".into(),
            ));
        }
        Ok(())
    }
}

//! Category taxonomy and weighting configuration.
//!
//! # Responsibility
//! - Partition the category vocabulary into required and optional sets.
//! - Carry the progress weighting as configuration, never hard-coded into
//!   the scoring formula.
//!
//! # Invariants
//! - The required set is non-empty and disjoint from the optional set.
//! - Weights are finite, non-negative and sum to 100.
//! - Category identifiers match `[a-z][a-z0-9_]*`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static CATEGORY_IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid category ident regex"));

const WEIGHT_SUM: f64 = 100.0;
const WEIGHT_EPSILON: f64 = 1e-6;

/// How completed optional categories convert into the optional share.
///
/// The historical rule set has exactly one optional category, awarded
/// all-or-nothing. Pro-rating across several optional categories is an
/// explicit configuration choice, never inferred from taxonomy shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalShareRule {
    /// Any one completed optional category grants the full optional share.
    #[default]
    AllOrNothing,
    /// The optional share scales with the completed/total optional ratio.
    ProRated,
}

/// Configuration errors detected when a taxonomy is injected into the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum TaxonomyError {
    /// At least one required category is needed for finalization rules.
    EmptyRequired,
    /// Identifier does not match `[a-z][a-z0-9_]*`.
    InvalidCategoryName(String),
    /// Category listed twice, or in both partitions.
    DuplicateCategory(String),
    /// Weights must be finite, non-negative and sum to 100; a taxonomy
    /// without optional categories must carry the full weight as required.
    InvalidWeights {
        required_weight: f64,
        optional_weight: f64,
    },
}

impl Display for TaxonomyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRequired => write!(f, "taxonomy requires at least one required category"),
            Self::InvalidCategoryName(name) => {
                write!(f, "invalid category identifier `{name}`")
            }
            Self::DuplicateCategory(name) => {
                write!(f, "category `{name}` appears more than once")
            }
            Self::InvalidWeights {
                required_weight,
                optional_weight,
            } => write!(
                f,
                "invalid weights required={required_weight} optional={optional_weight}; \
                 expected non-negative values summing to 100"
            ),
        }
    }
}

impl Error for TaxonomyError {}

/// Fixed, ordered category vocabulary with its progress weighting.
///
/// Injected into `CompletionEngine`; every call site depends on the engine
/// and none redefines the partition or the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    required: Vec<String>,
    optional: Vec<String>,
    required_weight: f64,
    optional_weight: f64,
    #[serde(default)]
    optional_share_rule: OptionalShareRule,
}

impl Taxonomy {
    /// Builds and validates a taxonomy.
    ///
    /// # Errors
    /// See `TaxonomyError` variants for the rejected shapes.
    pub fn new(
        required: Vec<String>,
        optional: Vec<String>,
        required_weight: f64,
        optional_weight: f64,
    ) -> Result<Self, TaxonomyError> {
        let taxonomy = Self {
            required,
            optional,
            required_weight,
            optional_weight,
            optional_share_rule: OptionalShareRule::default(),
        };
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// The standard production taxonomy: lighting, electrical and budget
    /// are required and jointly worth 75%; sketch is an optional 25% bonus.
    pub fn standard() -> Self {
        Self::new(
            vec![
                "lighting".to_string(),
                "electrical".to_string(),
                "budget".to_string(),
            ],
            vec!["sketch".to_string()],
            75.0,
            25.0,
        )
        .expect("standard taxonomy is valid")
    }

    /// Overrides how the optional share is awarded.
    pub fn with_optional_share_rule(mut self, rule: OptionalShareRule) -> Self {
        self.optional_share_rule = rule;
        self
    }

    /// Checks all configuration invariants.
    ///
    /// Called by `new` and by `CompletionEngine::new`, so taxonomies decoded
    /// from configuration documents are validated at the injection point.
    pub fn validate(&self) -> Result<(), TaxonomyError> {
        if self.required.is_empty() {
            return Err(TaxonomyError::EmptyRequired);
        }

        let mut seen = BTreeSet::new();
        for name in self.vocabulary() {
            if !CATEGORY_IDENT_RE.is_match(name) {
                return Err(TaxonomyError::InvalidCategoryName(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(TaxonomyError::DuplicateCategory(name.to_string()));
            }
        }

        let weights_invalid = !self.required_weight.is_finite()
            || !self.optional_weight.is_finite()
            || self.required_weight < 0.0
            || self.optional_weight < 0.0
            || (self.required_weight + self.optional_weight - WEIGHT_SUM).abs() > WEIGHT_EPSILON
            || (self.optional.is_empty() && self.optional_weight != 0.0);
        if weights_invalid {
            return Err(TaxonomyError::InvalidWeights {
                required_weight: self.required_weight,
                optional_weight: self.optional_weight,
            });
        }

        Ok(())
    }

    /// Required categories in declaration order.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Optional categories in declaration order.
    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    /// Share of total progress carried by the required set.
    pub fn required_weight(&self) -> f64 {
        self.required_weight
    }

    /// Share of total progress carried by the optional set.
    pub fn optional_weight(&self) -> f64 {
        self.optional_weight
    }

    /// Active optional-share rule.
    pub fn optional_share_rule(&self) -> OptionalShareRule {
        self.optional_share_rule
    }

    /// Full vocabulary: required categories first, then optional.
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .map(String::as_str)
    }

    /// Whether the name belongs to the vocabulary.
    pub fn contains(&self, name: &str) -> bool {
        self.vocabulary().any(|known| known == name)
    }

    /// Whether the name belongs to the required partition.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|known| known == name)
    }
}

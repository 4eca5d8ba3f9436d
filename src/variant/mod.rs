//! Experiment variant identifiers
//!
//! A variant names one misreporting configuration of a simulator run. The
//! identifier grammar is
//!
//! ```text
//! "none" | node_<node_id>_<behavior>_p<percent>
//! ```
//!
//! with behavior in {zero, triple, add} (case-insensitive) and percent in
//! \[1,100\]. `"none"` is the baseline every diff is taken against.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// How a misreporting node falsifies its congestion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    /// Report zero
    Zero,
    /// Report three times the true value
    Triple,
    /// Report the true value plus a fixed offset
    Add,
}

impl Behavior {
    /// Uppercase token used in misreporting-profile files consumed by the
    /// simulator (`"1\n<node> ZERO <prob>"`).
    #[must_use]
    pub const fn config_token(self) -> &'static str {
        match self {
            Self::Zero => "ZERO",
            Self::Triple => "TRIPLE",
            Self::Add => "ADD",
        }
    }

    /// Lowercase label used inside variant identifiers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::Triple => "triple",
            Self::Add => "add",
        }
    }
}

impl FromStr for Behavior {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "zero" => Ok(Self::Zero),
            "triple" => Ok(Self::Triple),
            "add" => Ok(Self::Add),
            _ => Err(Error::InvalidVariant(s.to_string())),
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A parsed experiment variant identifier.
///
/// The baseline (`"none"`) carries no node, behavior, or probability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantId {
    id: String,
    node_id: Option<u32>,
    behavior: Option<Behavior>,
    probability_percent: Option<u8>,
}

impl VariantId {
    /// The baseline variant, `"none"`.
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            id: "none".to_string(),
            node_id: None,
            behavior: None,
            probability_percent: None,
        }
    }

    /// Build an identifier for a misreporting node.
    #[must_use]
    pub fn misreporting(node_id: u32, behavior: Behavior, probability_percent: u8) -> Self {
        Self {
            id: format!("node_{node_id}_{}_p{probability_percent}", behavior.label()),
            node_id: Some(node_id),
            behavior: Some(behavior),
            probability_percent: Some(probability_percent),
        }
    }

    /// Raw identifier string.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Misreporting node, absent for the baseline.
    #[must_use]
    pub const fn node_id(&self) -> Option<u32> {
        self.node_id
    }

    /// Misreporting behavior, absent for the baseline.
    #[must_use]
    pub const fn behavior(&self) -> Option<Behavior> {
        self.behavior
    }

    /// Misreporting probability in percent, absent for the baseline.
    #[must_use]
    pub const fn probability_percent(&self) -> Option<u8> {
        self.probability_percent
    }

    /// Whether this is the baseline (`"none"`) variant.
    #[must_use]
    pub const fn is_baseline(&self) -> bool {
        self.node_id.is_none()
    }

    /// Probability for probability-indexed outputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedProbability`] when the identifier carries
    /// none (the baseline, or a free-form identifier without `p<digits>`).
    pub fn probability(&self) -> Result<u8> {
        self.probability_percent
            .ok_or_else(|| Error::UnresolvedProbability(self.id.clone()))
    }

    /// Identifiers of a probability sweep: `p = step, 2*step, ..., 100`.
    ///
    /// A zero step yields no variants (and a diagnostic) rather than an
    /// infinite loop.
    #[must_use]
    pub fn sweep(node_id: u32, behavior: Behavior, step: u8) -> Vec<Self> {
        if step == 0 {
            tracing::warn!(node_id, "probability sweep with step 0 yields no variants");
            return Vec::new();
        }
        (1..=100 / u32::from(step))
            .map(|i| {
                #[allow(clippy::cast_possible_truncation)]
                let p = (i * u32::from(step)) as u8;
                Self::misreporting(node_id, behavior, p)
            })
            .collect()
    }

    /// Body of the misreporting-profile file handed to the simulator:
    /// a count line followed by `<node> <BEHAVIOR> <prob>`.
    ///
    /// `None` for the baseline, which has no profile file.
    #[must_use]
    pub fn misrep_profile_body(&self) -> Option<String> {
        match (self.node_id, self.behavior, self.probability_percent) {
            (Some(node), Some(behavior), Some(p)) => {
                Some(format!("1\n{node} {} {p}", behavior.config_token()))
            }
            _ => None,
        }
    }
}

impl FromStr for VariantId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == "none" {
            return Ok(Self::baseline());
        }
        let invalid = || Error::InvalidVariant(s.to_string());

        let rest = s.strip_prefix("node_").ok_or_else(invalid)?;
        // node id may not contain '_', behavior may not, probability is last
        let mut parts = rest.splitn(3, '_');
        let node_id: u32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let behavior: Behavior = parts
            .next()
            .ok_or_else(invalid)?
            .parse()
            .map_err(|_| invalid())?;
        let prob_part = parts.next().ok_or_else(invalid)?;
        let digits = prob_part.strip_prefix('p').ok_or_else(invalid)?;
        let probability: u8 = digits.parse().map_err(|_| invalid())?;
        if !(1..=100).contains(&probability) {
            return Err(invalid());
        }

        Ok(Self {
            id: s.to_string(),
            node_id: Some(node_id),
            behavior: Some(behavior),
            probability_percent: Some(probability),
        })
    }
}

impl fmt::Display for VariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Extract a trailing `p<digits>` probability from any identifier string.
///
/// More permissive than the full grammar: any identifier ending in
/// `p<digits>` with the digits in \[1,100\] qualifies, matching how surface
/// inputs name their probability axis. Returns `None` (with a diagnostic)
/// otherwise; such identifiers cannot be placed on a probability axis.
#[must_use]
pub fn extract_probability(id: &str) -> Option<u8> {
    let (_, digits) = id.rsplit_once('p')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        tracing::warn!(id, "identifier has no trailing p<digits> probability");
        return None;
    }
    match digits.parse::<u8>() {
        Ok(p) if (1..=100).contains(&p) => Some(p),
        _ => {
            tracing::warn!(id, "trailing probability outside (0,100]");
            None
        }
    }
}

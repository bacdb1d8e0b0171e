//! Structured filter specification accepted by rollups and listings.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::common::{impl_tagged, Tagged};
use crate::errors::{Result, RollupError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum AccountClassType {
    #[default]
    All,
    Government,
    NonGovernment,
}

impl Tagged for AccountClassType {
    const KIND: &'static str = "account class type";
    const TAGS: &'static [(&'static str, Self)] = &[
        ("ALL", Self::All),
        ("GOVERNMENT", Self::Government),
        ("NON_GOVERNMENT", Self::NonGovernment),
    ];
}
impl_tagged!(AccountClassType);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum MitType {
    #[default]
    All,
    Mit,
    NonMit,
}

impl Tagged for MitType {
    const KIND: &'static str = "MIT type";
    const TAGS: &'static [(&'static str, Self)] = &[
        ("ALL", Self::All),
        ("MIT", Self::Mit),
        ("NON_MIT", Self::NonMit),
    ];
}
impl_tagged!(MitType);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BalanceSign {
    Positive,
    Negative,
    Zero,
}

impl Tagged for BalanceSign {
    const KIND: &'static str = "balance sign";
    const TAGS: &'static [(&'static str, Self)] = &[
        ("Positive", Self::Positive),
        ("Negative", Self::Negative),
        ("Zero", Self::Zero),
    ];
}
impl_tagged!(BalanceSign);

impl BalanceSign {
    pub fn admits(self, amount: f64) -> bool {
        match self {
            BalanceSign::Positive => amount > 0.0,
            BalanceSign::Negative => amount < 0.0,
            BalanceSign::Zero => amount == 0.0,
        }
    }
}

/// Aging bracket on months outstanding. Each bracket is `[lower, upper)`;
/// the terminal bracket has no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum AgingBucket {
    UpTo3,
    From3To6,
    From6To9,
    From9To12,
    Over12,
}

impl Tagged for AgingBucket {
    const KIND: &'static str = "aging bucket";
    const TAGS: &'static [(&'static str, Self)] = &[
        ("0-3", Self::UpTo3),
        ("3-6", Self::From3To6),
        ("6-9", Self::From6To9),
        ("9-12", Self::From9To12),
        (">12", Self::Over12),
    ];
}
impl_tagged!(AgingBucket);

impl AgingBucket {
    pub fn bounds(self) -> (f64, Option<f64>) {
        match self {
            AgingBucket::UpTo3 => (0.0, Some(3.0)),
            AgingBucket::From3To6 => (3.0, Some(6.0)),
            AgingBucket::From6To9 => (6.0, Some(9.0)),
            AgingBucket::From9To12 => (9.0, Some(12.0)),
            AgingBucket::Over12 => (12.0, None),
        }
    }

    pub fn contains(self, months: f64) -> bool {
        let (lower, upper) = self.bounds();
        months >= lower && upper.map_or(true, |upper| months < upper)
    }
}

/// A range bound as submitted by the caller. Text that does not parse as a
/// number disables the range clause instead of failing the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeBound {
    Number(f64),
    Text(String),
}

impl RangeBound {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RangeBound::Number(value) => Some(*value).filter(|v| v.is_finite()),
            RangeBound::Text(raw) => raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        }
    }
}

impl From<f64> for RangeBound {
    fn from(value: f64) -> Self {
        RangeBound::Number(value)
    }
}

/// Inclusive range on outstanding amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutstandingRange {
    pub min: RangeBound,
    pub max: RangeBound,
}

impl OutstandingRange {
    pub fn new(min: impl Into<RangeBound>, max: impl Into<RangeBound>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Numeric bounds, or `None` when either side is not a number.
    pub fn numeric_bounds(&self) -> Option<(f64, f64)> {
        Some((self.min.as_number()?, self.max.as_number()?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    pub account_class_type: AccountClassType,
    pub mit_type: MitType,
    pub business_areas: BTreeSet<String>,
    pub adids: BTreeSet<String>,
    pub account_status: Option<String>,
    pub balance_sign: Option<BalanceSign>,
    pub account_class: Option<String>,
    pub aging_bucket: Option<AgingBucket>,
    pub outstanding_range: Option<OutstandingRange>,
    pub smer_segments: BTreeSet<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account_class_type(mut self, value: AccountClassType) -> Self {
        self.account_class_type = value;
        self
    }

    pub fn with_mit_type(mut self, value: MitType) -> Self {
        self.mit_type = value;
        self
    }

    pub fn with_business_areas<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.business_areas = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_adids<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.adids = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_smer_segments<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.smer_segments = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_balance_sign(mut self, sign: BalanceSign) -> Self {
        self.balance_sign = Some(sign);
        self
    }

    pub fn with_aging_bucket(mut self, bucket: AgingBucket) -> Self {
        self.aging_bucket = Some(bucket);
        self
    }

    pub fn with_outstanding_range(mut self, range: OutstandingRange) -> Self {
        self.outstanding_range = Some(range);
        self
    }

    /// Copy with surrounding whitespace stripped from every code. Blank
    /// optional codes become absent; blank set entries stay so that
    /// [`FilterSpec::validate`] still rejects them.
    pub fn normalized(&self) -> FilterSpec {
        fn codes(set: &BTreeSet<String>) -> BTreeSet<String> {
            set.iter().map(|code| code.trim().to_string()).collect()
        }
        fn optional(value: Option<&str>) -> Option<String> {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        }
        FilterSpec {
            business_areas: codes(&self.business_areas),
            adids: codes(&self.adids),
            smer_segments: codes(&self.smer_segments),
            account_status: optional(self.account_status.as_deref()),
            account_class: optional(self.account_class.as_deref()),
            ..self.clone()
        }
    }

    /// Rejects filters that cannot describe any coherent selection.
    pub fn validate(&self) -> Result<()> {
        if let Some((min, max)) = self
            .outstanding_range
            .as_ref()
            .and_then(OutstandingRange::numeric_bounds)
        {
            if min > max {
                return Err(RollupError::Validation(format!(
                    "outstanding range min {} exceeds max {}",
                    min, max
                )));
            }
        }
        let blank_codes = [
            ("business area", &self.business_areas),
            ("ADID", &self.adids),
            ("SMER segment", &self.smer_segments),
        ];
        for (label, codes) in blank_codes {
            if codes.iter().any(|code| code.trim().is_empty()) {
                return Err(RollupError::Validation(format!(
                    "{} filter contains an empty code",
                    label
                )));
            }
        }
        Ok(())
    }
}

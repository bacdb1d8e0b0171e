//! Static dimension configuration: key extraction, canonical orders and
//! station names.

use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashSet},
};

use once_cell::sync::Lazy;

use crate::config::EngineConfig;
use crate::domain::{AccountClassType, AggregationDimension, DebtRecord, FilterSpec};
use crate::errors::{Result, RollupError};

static STANDARD: Lazy<DimensionCatalog> =
    Lazy::new(|| DimensionCatalog::build(&EngineConfig::default()));

/// Immutable lookup tables injected into the predicate builder, the
/// aggregator and the rollup composer.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionCatalog {
    business_areas: BTreeMap<String, String>,
    account_class_order: Vec<String>,
    government_classes: BTreeSet<String>,
    non_government_classes: BTreeSet<String>,
    adid_order: Vec<String>,
    blank_segment_label: String,
    unassigned_staff_label: String,
}

impl DimensionCatalog {
    /// Catalog built from the default configuration tables.
    pub fn standard() -> Self {
        STANDARD.clone()
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        ensure_unique("account class order", &config.account_class_order)?;
        ensure_unique("ADID order", &config.adid_order)?;
        for (label, classes) in [
            ("government", &config.government_classes),
            ("non-government", &config.non_government_classes),
        ] {
            if let Some(unknown) = classes
                .iter()
                .find(|code| !config.account_class_order.contains(code))
            {
                return Err(RollupError::Config(format!(
                    "{} class `{}` is missing from the account class order",
                    label, unknown
                )));
            }
        }
        if let Some(shared) = config
            .government_classes
            .iter()
            .find(|code| config.non_government_classes.contains(code))
        {
            return Err(RollupError::Config(format!(
                "class `{}` is both government and non-government",
                shared
            )));
        }
        if config.blank_segment_label.trim().is_empty()
            || config.unassigned_staff_label.trim().is_empty()
        {
            return Err(RollupError::Config(
                "placeholder labels must not be empty".into(),
            ));
        }
        Ok(Self::build(config))
    }

    fn build(config: &EngineConfig) -> Self {
        Self {
            business_areas: config.business_areas.clone(),
            account_class_order: config.account_class_order.clone(),
            government_classes: config.government_classes.iter().cloned().collect(),
            non_government_classes: config.non_government_classes.iter().cloned().collect(),
            adid_order: config.adid_order.clone(),
            blank_segment_label: config.blank_segment_label.clone(),
            unassigned_staff_label: config.unassigned_staff_label.clone(),
        }
    }

    /// Display name of a station; unknown codes display as themselves.
    pub fn station_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.business_areas
            .get(code)
            .map(String::as_str)
            .unwrap_or(code)
    }

    pub fn government_classes(&self) -> &BTreeSet<String> {
        &self.government_classes
    }

    pub fn non_government_classes(&self) -> &BTreeSet<String> {
        &self.non_government_classes
    }

    pub fn blank_segment_label(&self) -> &str {
        &self.blank_segment_label
    }

    /// Parent-group key of a record: its business area code.
    pub fn parent_key<'a>(&self, record: &'a DebtRecord) -> &'a str {
        record.business_area.trim()
    }

    /// Grouping key of a record for `dimension`. Blank staff and segment
    /// values collapse onto their placeholder labels.
    pub fn dimension_key<'a>(
        &'a self,
        dimension: AggregationDimension,
        record: &'a DebtRecord,
    ) -> Cow<'a, str> {
        match dimension {
            AggregationDimension::Station => Cow::Borrowed(record.business_area.trim()),
            AggregationDimension::AccountClass => Cow::Borrowed(record.account_class.trim()),
            AggregationDimension::Adid => Cow::Borrowed(record.adid.trim()),
            AggregationDimension::Staff => {
                let staff = record.staff_id.trim();
                if staff.is_empty() {
                    Cow::Borrowed(self.unassigned_staff_label.as_str())
                } else {
                    Cow::Borrowed(staff)
                }
            }
            AggregationDimension::SmerSegment => match record
                .smer_segment
                .as_deref()
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
            {
                Some(segment) => Cow::Borrowed(segment),
                None => Cow::Borrowed(self.blank_segment_label.as_str()),
            },
        }
    }

    /// Presentation value for a grouping key.
    pub fn display_value(&self, dimension: AggregationDimension, key: &str) -> String {
        match dimension {
            AggregationDimension::Station => self.station_name(key).to_string(),
            _ => key.to_string(),
        }
    }

    pub fn canonical_order(&self, dimension: AggregationDimension) -> Option<&[String]> {
        match dimension {
            AggregationDimension::AccountClass => Some(&self.account_class_order),
            AggregationDimension::Adid => Some(&self.adid_order),
            _ => None,
        }
    }

    /// Taxonomy codes a filtered result can contain, in canonical order.
    /// Codes the filter excludes are dropped so they never show as zero rows.
    /// The filter is read through [`FilterSpec::normalized`], the same view
    /// the predicate builder applies to rows.
    pub fn admissible_codes(
        &self,
        dimension: AggregationDimension,
        filter: &FilterSpec,
    ) -> Option<Vec<String>> {
        let order = self.canonical_order(dimension)?;
        let filter = filter.normalized();
        let codes = order
            .iter()
            .filter(|code| match dimension {
                AggregationDimension::AccountClass => {
                    let by_type = match filter.account_class_type {
                        AccountClassType::All => true,
                        AccountClassType::Government => self.government_classes.contains(*code),
                        AccountClassType::NonGovernment => {
                            self.non_government_classes.contains(*code)
                        }
                    };
                    let by_exact = filter
                        .account_class
                        .as_deref()
                        .map_or(true, |exact| exact == code.as_str());
                    by_type && by_exact
                }
                AggregationDimension::Adid => {
                    filter.adids.is_empty() || filter.adids.contains(*code)
                }
                _ => true,
            })
            .cloned()
            .collect();
        Some(codes)
    }
}

impl Default for DimensionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn ensure_unique(label: &str, codes: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for code in codes {
        if !seen.insert(code.as_str()) {
            return Err(RollupError::Config(format!(
                "{} lists `{}` more than once",
                label, code
            )));
        }
    }
    Ok(())
}

//! Two-level rollup: parent-group nodes holding ordered dimension-value
//! leaves, plus a grand total.

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use serde::Serialize;

use crate::core::aggregator::{AggregatedGroup, AggregationOutput};
use crate::core::catalog::DimensionCatalog;
use crate::domain::{AggregationDimension, FilterSpec, Measure, MeasureSums, ViewPolicy};

/// Share of the grand total, kept unrounded; rounding happens on display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Percentage(f64);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.0);
    pub const FULL: Percentage = Percentage(100.0);

    /// `100 * part / total`; a zero or non-finite total yields zero.
    pub fn of(part: f64, total: f64) -> Self {
        if total == 0.0 || !total.is_finite() {
            return Self::ZERO;
        }
        let value = 100.0 * part / total;
        if value.is_finite() {
            Percentage(value)
        } else {
            Self::ZERO
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Two-decimal rendering, never `-0.00`.
    pub fn to_display(self) -> String {
        let text = format!("{:.2}", self.0);
        if text == "-0.00" {
            "0.00".to_string()
        } else {
            text
        }
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregate {
    pub dimension_value: String,
    pub count: u64,
    pub measures: MeasureSums,
    pub percentage: Percentage,
}

impl GroupAggregate {
    fn empty(dimension_value: impl Into<String>) -> Self {
        Self {
            dimension_value: dimension_value.into(),
            count: 0,
            measures: MeasureSums::default(),
            percentage: Percentage::ZERO,
        }
    }

    fn absorb(&mut self, other: &GroupAggregate) {
        self.count += other.count;
        self.measures.merge(&other.measures);
    }
}

/// One station with its dimension-value leaves in presentation order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentGroupNode {
    pub business_area: String,
    pub station: String,
    pub subtotal: GroupAggregate,
    pub leaves: Vec<GroupAggregate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollupResult {
    pub view: ViewPolicy,
    pub dimension: AggregationDimension,
    pub base_measure: Measure,
    pub groups: Vec<ParentGroupNode>,
    pub grand_total: GroupAggregate,
}

impl RollupResult {
    /// Leaves in output order, each paired with its parent node.
    pub fn rows(&self) -> impl Iterator<Item = (&ParentGroupNode, &GroupAggregate)> {
        self.groups
            .iter()
            .flat_map(|node| node.leaves.iter().map(move |leaf| (node, leaf)))
    }

    pub fn subtotals(&self) -> impl Iterator<Item = &GroupAggregate> {
        self.groups.iter().map(|node| &node.subtotal)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Builds a [`RollupResult`] from aggregator output.
pub struct RollupComposer<'a> {
    catalog: &'a DimensionCatalog,
    dimension: AggregationDimension,
    view: ViewPolicy,
}

impl<'a> RollupComposer<'a> {
    pub fn new(
        catalog: &'a DimensionCatalog,
        dimension: AggregationDimension,
        view: ViewPolicy,
    ) -> Self {
        Self {
            catalog,
            dimension,
            view,
        }
    }

    pub fn compose(&self, output: AggregationOutput, filter: &FilterSpec) -> RollupResult {
        let base_measure = self.view.percentage_base(self.dimension);
        let taxonomy = self.catalog.admissible_codes(self.dimension, filter);

        let mut by_parent: BTreeMap<String, Vec<AggregatedGroup>> = BTreeMap::new();
        for group in output.groups {
            by_parent
                .entry(group.parent_key.clone())
                .or_default()
                .push(group);
        }

        let mut groups: Vec<ParentGroupNode> = by_parent
            .into_iter()
            .map(|(parent, members)| self.parent_node(parent, members, taxonomy.as_deref()))
            .collect();

        let mut grand_total = GroupAggregate::empty("");
        for node in &groups {
            grand_total.absorb(&node.subtotal);
        }
        let denominator = grand_total.measures.get(base_measure);
        grand_total.percentage = if denominator == 0.0 {
            Percentage::ZERO
        } else {
            Percentage::FULL
        };

        for node in &mut groups {
            node.subtotal.percentage =
                Percentage::of(node.subtotal.measures.get(base_measure), denominator);
            for leaf in &mut node.leaves {
                leaf.percentage = Percentage::of(leaf.measures.get(base_measure), denominator);
            }
            self.order_leaves(&mut node.leaves, taxonomy.as_deref());
        }
        groups.sort_by(|a, b| {
            descending(a.subtotal.percentage, b.subtotal.percentage)
                .then_with(|| a.business_area.cmp(&b.business_area))
        });

        RollupResult {
            view: self.view,
            dimension: self.dimension,
            base_measure,
            groups,
            grand_total,
        }
    }

    fn parent_node(
        &self,
        parent: String,
        members: Vec<AggregatedGroup>,
        taxonomy: Option<&[String]>,
    ) -> ParentGroupNode {
        let mut leaves: Vec<GroupAggregate> = members
            .into_iter()
            .map(|group| GroupAggregate {
                dimension_value: self.catalog.display_value(self.dimension, &group.dimension_key),
                count: group.count,
                measures: group.sums,
                percentage: Percentage::ZERO,
            })
            .collect();

        if let Some(codes) = taxonomy {
            let has_taxonomy_code = leaves
                .iter()
                .any(|leaf| codes.contains(&leaf.dimension_value));
            if has_taxonomy_code {
                for code in codes {
                    if !leaves.iter().any(|leaf| &leaf.dimension_value == code) {
                        leaves.push(GroupAggregate::empty(code.clone()));
                    }
                }
            }
        }

        let mut subtotal = GroupAggregate::empty(self.catalog.station_name(&parent));
        for leaf in &leaves {
            subtotal.absorb(leaf);
        }

        ParentGroupNode {
            station: self.catalog.station_name(&parent).to_string(),
            business_area: parent,
            subtotal,
            leaves,
        }
    }

    /// Taxonomy codes first in canonical order, then everything else by
    /// descending share.
    fn order_leaves(&self, leaves: &mut [GroupAggregate], taxonomy: Option<&[String]>) {
        let rank = |leaf: &GroupAggregate| -> Option<usize> {
            taxonomy.and_then(|codes| codes.iter().position(|code| *code == leaf.dimension_value))
        };
        leaves.sort_by(|a, b| match (rank(a), rank(b)) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => descending(a.percentage, b.percentage)
                .then_with(|| a.dimension_value.cmp(&b.dimension_value)),
        });
    }
}

fn descending(a: Percentage, b: Percentage) -> Ordering {
    b.value().total_cmp(&a.value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::DimensionAggregator;
    use crate::domain::{AccountClassType, DebtRecord};

    fn rollup(
        records: &[DebtRecord],
        dimension: AggregationDimension,
        filter: &FilterSpec,
    ) -> RollupResult {
        let catalog = DimensionCatalog::standard();
        let mut aggregator = DimensionAggregator::new(&catalog, dimension, ViewPolicy::AgedDebt);
        for record in records {
            aggregator.push(record);
        }
        RollupComposer::new(&catalog, dimension, ViewPolicy::AgedDebt)
            .compose(aggregator.finish(), filter)
    }

    fn leaf_summary(result: &RollupResult) -> Vec<(String, f64, String)> {
        result
            .rows()
            .map(|(_, leaf)| {
                (
                    leaf.dimension_value.clone(),
                    leaf.measures.outstanding_amount,
                    leaf.percentage.to_display(),
                )
            })
            .collect()
    }

    #[test]
    fn percentage_formatting_edge_cases() {
        assert_eq!(Percentage::of(1.0, 3.0).to_display(), "33.33");
        assert_eq!(Percentage::of(2.0, 3.0).to_display(), "66.67");
        assert_eq!(Percentage::of(5.0, 0.0).to_display(), "0.00");
        assert_eq!(Percentage::of(-0.0001, 100.0).to_display(), "0.00");
        assert_eq!(Percentage::of(-50.0, 200.0).to_display(), "-25.00");
    }

    #[test]
    fn canonical_order_fills_missing_codes_with_zero() {
        let records = vec![
            DebtRecord::new("A", "6210", "LPCG", 1000.0),
            DebtRecord::new("B", "6210", "OPCG", 2000.0),
        ];
        let result = rollup(&records, AggregationDimension::AccountClass, &FilterSpec::new());
        assert_eq!(
            leaf_summary(&result),
            vec![
                ("OPCN".to_string(), 0.0, "0.00".to_string()),
                ("LPCN".to_string(), 0.0, "0.00".to_string()),
                ("LPCG".to_string(), 1000.0, "33.33".to_string()),
                ("OPCG".to_string(), 2000.0, "66.67".to_string()),
            ]
        );
    }

    #[test]
    fn codes_outside_taxonomy_follow_canonical_codes() {
        let records = vec![
            DebtRecord::new("A", "6210", "ZZZZ", 10.0),
            DebtRecord::new("B", "6210", "YYYY", 30.0),
            DebtRecord::new("C", "6210", "LPCG", 60.0),
        ];
        let filter = FilterSpec::new().with_account_class_type(AccountClassType::All);
        let result = rollup(&records, AggregationDimension::AccountClass, &filter);
        let values: Vec<_> = result
            .rows()
            .map(|(_, leaf)| leaf.dimension_value.as_str())
            .collect();
        assert_eq!(values, vec!["OPCN", "LPCN", "LPCG", "OPCG", "YYYY", "ZZZZ"]);
    }

    #[test]
    fn parent_without_taxonomy_codes_is_not_zero_filled() {
        let records = vec![DebtRecord::new("A", "6210", "ZZZZ", 10.0)];
        let result = rollup(&records, AggregationDimension::AccountClass, &FilterSpec::new());
        assert_eq!(result.rows().count(), 1);
    }

    #[test]
    fn parents_sorted_by_descending_share() {
        let mut records = vec![
            DebtRecord::new("A", "6210", "LPCG", 100.0),
            DebtRecord::new("B", "6220", "LPCG", 300.0),
            DebtRecord::new("C", "6230", "LPCG", 200.0),
        ];
        records[0].staff_id = "S1".into();
        records[1].staff_id = "S2".into();
        records[2].staff_id = "S3".into();
        let result = rollup(&records, AggregationDimension::Staff, &FilterSpec::new());
        let parents: Vec<_> = result
            .groups
            .iter()
            .map(|node| node.business_area.as_str())
            .collect();
        assert_eq!(parents, vec!["6220", "6230", "6210"]);
        assert_eq!(result.groups[0].station, "Northern");
    }

    #[test]
    fn leaves_sorted_by_share_for_open_dimensions() {
        let mut low = DebtRecord::new("A", "6210", "LPCG", 10.0);
        low.staff_id = "ALPHA".into();
        let mut high = DebtRecord::new("B", "6210", "LPCG", 90.0);
        high.staff_id = "BETA".into();
        let blank = DebtRecord::new("C", "6210", "LPCG", 10.0);
        let result = rollup(
            &[low, high, blank],
            AggregationDimension::Staff,
            &FilterSpec::new(),
        );
        let values: Vec<_> = result
            .rows()
            .map(|(_, leaf)| leaf.dimension_value.as_str())
            .collect();
        assert_eq!(values, vec!["BETA", "ALPHA", "Unassigned"]);
    }

    #[test]
    fn empty_output_yields_zero_grand_total() {
        let result = rollup(&[], AggregationDimension::Station, &FilterSpec::new());
        assert!(result.is_empty());
        assert_eq!(result.grand_total.count, 0);
        assert_eq!(result.grand_total.percentage.to_display(), "0.00");
    }

    #[test]
    fn subtotals_sum_their_leaves() {
        let records = vec![
            DebtRecord::new("A", "6210", "LPCG", 1.5),
            DebtRecord::new("B", "6210", "OPCN", 2.5),
            DebtRecord::new("C", "6211", "LPCN", 4.0),
        ];
        let result = rollup(&records, AggregationDimension::AccountClass, &FilterSpec::new());
        for node in &result.groups {
            let count: u64 = node.leaves.iter().map(|leaf| leaf.count).sum();
            let amount: f64 = node
                .leaves
                .iter()
                .map(|leaf| leaf.measures.outstanding_amount)
                .sum();
            assert_eq!(node.subtotal.count, count);
            assert_eq!(node.subtotal.measures.outstanding_amount, amount);
        }
        assert_eq!(result.grand_total.count, 3);
        assert_eq!(result.grand_total.measures.outstanding_amount, 8.0);
        assert_eq!(result.grand_total.percentage, Percentage::FULL);
    }
}

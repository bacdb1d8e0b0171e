//! Wire contract of a rollup answer.

use serde::{Deserialize, Serialize};

use crate::core::rollup::{GroupAggregate, ParentGroupNode, RollupResult};
use crate::domain::{Measure, MeasureSums, ViewPolicy};

/// Measures of a leaf row; fields outside the view are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasureFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_undue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_month_unpaid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outstanding_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_unpaid: Option<f64>,
}

impl MeasureFields {
    fn from_sums(view: ViewPolicy, sums: &MeasureSums) -> Self {
        let pick = |measure: Measure| view.includes(measure).then(|| sums.get(measure));
        Self {
            total_undue: pick(Measure::TotalUndue),
            current_month_unpaid: pick(Measure::CurrentMonthUnpaid),
            outstanding_amount: pick(Measure::OutstandingAmount),
            total_unpaid: pick(Measure::TotalUnpaid),
        }
    }
}

/// Same measures under their `total`-prefixed names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalMeasureFields {
    #[serde(
        rename = "totalTotalUndue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_undue: Option<f64>,
    #[serde(
        rename = "totalCurrentMonthUnpaid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_month_unpaid: Option<f64>,
    #[serde(
        rename = "totalOutstandingAmount",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub outstanding_amount: Option<f64>,
    #[serde(
        rename = "totalTotalUnpaid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_unpaid: Option<f64>,
}

impl From<MeasureFields> for TotalMeasureFields {
    fn from(fields: MeasureFields) -> Self {
        Self {
            total_undue: fields.total_undue,
            current_month_unpaid: fields.current_month_unpaid,
            outstanding_amount: fields.outstanding_amount,
            total_unpaid: fields.total_unpaid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupRow {
    pub business_area: String,
    pub station: String,
    pub dimension_value: String,
    pub number_of_accounts: u64,
    #[serde(flatten)]
    pub measures: MeasureFields,
    pub percent_of_total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentTotal {
    pub business_area: String,
    pub station: String,
    pub total_number_of_accounts: u64,
    #[serde(flatten)]
    pub measures: TotalMeasureFields,
    pub total_percent_of_total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrandTotal {
    pub total_number_of_accounts: u64,
    #[serde(flatten)]
    pub measures: TotalMeasureFields,
    pub total_percent_of_total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupResponse {
    pub rows: Vec<RollupRow>,
    pub parent_totals: Vec<ParentTotal>,
    pub grand_total: GrandTotal,
}

impl RollupResponse {
    pub fn to_json(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> crate::errors::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn assemble(result: &RollupResult) -> RollupResponse {
        let view = result.view;
        let rows = result
            .rows()
            .map(|(node, leaf)| RollupRow {
                business_area: node.business_area.clone(),
                station: node.station.clone(),
                dimension_value: leaf.dimension_value.clone(),
                number_of_accounts: leaf.count,
                measures: MeasureFields::from_sums(view, &leaf.measures),
                percent_of_total: leaf.percentage.to_display(),
            })
            .collect();
        let parent_totals = result
            .groups
            .iter()
            .map(|node| Self::parent_total(view, node))
            .collect();
        RollupResponse {
            rows,
            parent_totals,
            grand_total: Self::grand_total(view, &result.grand_total),
        }
    }

    fn parent_total(view: ViewPolicy, node: &ParentGroupNode) -> ParentTotal {
        ParentTotal {
            business_area: node.business_area.clone(),
            station: node.station.clone(),
            total_number_of_accounts: node.subtotal.count,
            measures: MeasureFields::from_sums(view, &node.subtotal.measures).into(),
            total_percent_of_total: node.subtotal.percentage.to_display(),
        }
    }

    fn grand_total(view: ViewPolicy, total: &GroupAggregate) -> GrandTotal {
        GrandTotal {
            total_number_of_accounts: total.count,
            measures: MeasureFields::from_sums(view, &total.measures).into(),
            total_percent_of_total: total.percentage.to_display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::DimensionAggregator;
    use crate::core::catalog::DimensionCatalog;
    use crate::core::rollup::RollupComposer;
    use crate::domain::{AggregationDimension, DebtRecord, FilterSpec};

    fn respond(view: ViewPolicy, records: &[DebtRecord]) -> RollupResponse {
        let catalog = DimensionCatalog::standard();
        let dimension = AggregationDimension::Station;
        let mut aggregator = DimensionAggregator::new(&catalog, dimension, view);
        for record in records {
            aggregator.push(record);
        }
        let result =
            RollupComposer::new(&catalog, dimension, view).compose(aggregator.finish(), &FilterSpec::new());
        ResponseAssembler::assemble(&result)
    }

    #[test]
    fn aged_debt_omits_trade_measures() {
        let response = respond(
            ViewPolicy::AgedDebt,
            &[DebtRecord::new("A", "6210", "LPCG", 10.0)],
        );
        let json = response.to_json().expect("serialize");
        assert!(json.contains("\"outstandingAmount\":10.0"));
        assert!(json.contains("\"totalOutstandingAmount\":10.0"));
        assert!(!json.contains("totalUndue"));
        assert!(!json.contains("totalUnpaid"));
    }

    #[test]
    fn trade_receivable_emits_measures_in_view_order() {
        let mut record = DebtRecord::new("A", "6210", "LPCG", 10.0);
        record.total_undue = 1.0;
        record.current_month_unpaid = 2.0;
        record.total_unpaid = 3.0;
        let response = respond(ViewPolicy::TradeReceivable, &[record]);
        let json = response.to_json().expect("serialize");

        let positions: Vec<usize> = [
            "\"totalUndue\"",
            "\"currentMonthUnpaid\"",
            "\"outstandingAmount\"",
            "\"totalUnpaid\"",
        ]
        .iter()
        .map(|field| json.find(field).expect("field present"))
        .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(json.contains("\"totalTotalUndue\":1.0"));
        assert!(json.contains("\"totalCurrentMonthUnpaid\":2.0"));
        assert!(json.contains("\"totalTotalUnpaid\":3.0"));
    }

    #[test]
    fn zero_match_response_is_empty_with_zero_grand_total() {
        let response = respond(ViewPolicy::AgedDebt, &[]);
        assert!(response.rows.is_empty());
        assert!(response.parent_totals.is_empty());
        assert_eq!(response.grand_total.total_number_of_accounts, 0);
        assert_eq!(response.grand_total.measures.outstanding_amount, Some(0.0));
        assert_eq!(response.grand_total.total_percent_of_total, "0.00");
    }

    #[test]
    fn response_round_trips_through_json() {
        let response = respond(
            ViewPolicy::AgedDebt,
            &[DebtRecord::new("A", "6211", "OPCN", 4.5)],
        );
        let json = response.to_json().expect("serialize");
        let parsed: RollupResponse = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, response);
        assert_eq!(parsed.rows[0].station, "Metro North");
        assert_eq!(parsed.rows[0].dimension_value, "Metro North");
    }
}

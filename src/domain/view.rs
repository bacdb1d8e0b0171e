//! View policy, aggregation dimensions and measure bookkeeping.

use serde::{Deserialize, Serialize};

use crate::domain::common::{impl_tagged, Tagged};
use crate::domain::record::{Column, DebtRecord};

/// Numeric fields that can be summed by a rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Measure {
    TotalUndue,
    CurrentMonthUnpaid,
    OutstandingAmount,
    TotalUnpaid,
}

impl Measure {
    pub fn column(self) -> Column {
        match self {
            Measure::TotalUndue => Column::TotalUndue,
            Measure::CurrentMonthUnpaid => Column::CurrentMonthUnpaid,
            Measure::OutstandingAmount => Column::OutstandingAmount,
            Measure::TotalUnpaid => Column::TotalUnpaid,
        }
    }

    pub fn value(self, record: &DebtRecord) -> f64 {
        match self {
            Measure::TotalUndue => record.total_undue,
            Measure::CurrentMonthUnpaid => record.current_month_unpaid,
            Measure::OutstandingAmount => record.outstanding_amount,
            Measure::TotalUnpaid => record.total_unpaid,
        }
    }

    /// Wire name of the measure on a row.
    pub fn field_name(self) -> &'static str {
        match self {
            Measure::TotalUndue => "totalUndue",
            Measure::CurrentMonthUnpaid => "currentMonthUnpaid",
            Measure::OutstandingAmount => "outstandingAmount",
            Measure::TotalUnpaid => "totalUnpaid",
        }
    }
}

/// Running sums for every measure. Measures outside the active view stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureSums {
    pub total_undue: f64,
    pub current_month_unpaid: f64,
    pub outstanding_amount: f64,
    pub total_unpaid: f64,
}

impl MeasureSums {
    pub fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::TotalUndue => self.total_undue,
            Measure::CurrentMonthUnpaid => self.current_month_unpaid,
            Measure::OutstandingAmount => self.outstanding_amount,
            Measure::TotalUnpaid => self.total_unpaid,
        }
    }

    pub fn add(&mut self, measure: Measure, amount: f64) {
        match measure {
            Measure::TotalUndue => self.total_undue += amount,
            Measure::CurrentMonthUnpaid => self.current_month_unpaid += amount,
            Measure::OutstandingAmount => self.outstanding_amount += amount,
            Measure::TotalUnpaid => self.total_unpaid += amount,
        }
    }

    pub fn add_record(&mut self, record: &DebtRecord, measures: &[Measure]) {
        for measure in measures {
            self.add(*measure, measure.value(record));
        }
    }

    pub fn merge(&mut self, other: &MeasureSums) {
        self.total_undue += other.total_undue;
        self.current_month_unpaid += other.current_month_unpaid;
        self.outstanding_amount += other.outstanding_amount;
        self.total_unpaid += other.total_unpaid;
    }
}

/// Selects which measures participate in a rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum ViewPolicy {
    AgedDebt,
    TradeReceivable,
}

impl Tagged for ViewPolicy {
    const KIND: &'static str = "view";
    const TAGS: &'static [(&'static str, Self)] = &[
        ("AgedDebt", Self::AgedDebt),
        ("TradeReceivable", Self::TradeReceivable),
    ];
}
impl_tagged!(ViewPolicy);

const AGED_DEBT_MEASURES: &[Measure] = &[Measure::OutstandingAmount];
const TRADE_RECEIVABLE_MEASURES: &[Measure] = &[
    Measure::TotalUndue,
    Measure::CurrentMonthUnpaid,
    Measure::OutstandingAmount,
    Measure::TotalUnpaid,
];

impl ViewPolicy {
    /// Summed measures in output order. The account count is always present.
    pub fn measures(self) -> &'static [Measure] {
        match self {
            ViewPolicy::AgedDebt => AGED_DEBT_MEASURES,
            ViewPolicy::TradeReceivable => TRADE_RECEIVABLE_MEASURES,
        }
    }

    /// Measure whose grand total is the percentage denominator. Kept as a
    /// full table so each (view, dimension) pair is pinned individually.
    pub fn percentage_base(self, dimension: AggregationDimension) -> Measure {
        use AggregationDimension::*;
        match (self, dimension) {
            (ViewPolicy::AgedDebt, Station) => Measure::OutstandingAmount,
            (ViewPolicy::AgedDebt, AccountClass) => Measure::OutstandingAmount,
            (ViewPolicy::AgedDebt, Adid) => Measure::OutstandingAmount,
            (ViewPolicy::AgedDebt, Staff) => Measure::OutstandingAmount,
            (ViewPolicy::AgedDebt, SmerSegment) => Measure::OutstandingAmount,
            (ViewPolicy::TradeReceivable, Station) => Measure::OutstandingAmount,
            (ViewPolicy::TradeReceivable, AccountClass) => Measure::OutstandingAmount,
            (ViewPolicy::TradeReceivable, Adid) => Measure::OutstandingAmount,
            (ViewPolicy::TradeReceivable, Staff) => Measure::OutstandingAmount,
            (ViewPolicy::TradeReceivable, SmerSegment) => Measure::OutstandingAmount,
        }
    }

    pub fn includes(self, measure: Measure) -> bool {
        self.measures().contains(&measure)
    }
}

/// Business dimension a rollup groups by. Every dimension nests under the
/// station (business area) as its parent group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum AggregationDimension {
    Station,
    AccountClass,
    Adid,
    Staff,
    SmerSegment,
}

impl Tagged for AggregationDimension {
    const KIND: &'static str = "dimension";
    const TAGS: &'static [(&'static str, Self)] = &[
        ("Station", Self::Station),
        ("AccountClass", Self::AccountClass),
        ("ADID", Self::Adid),
        ("Staff", Self::Staff),
        ("SmerSegment", Self::SmerSegment),
    ];
}
impl_tagged!(AggregationDimension);

impl AggregationDimension {
    /// Column the dimension value is read from.
    pub fn key_column(self) -> Column {
        match self {
            AggregationDimension::Station => Column::BusinessArea,
            AggregationDimension::AccountClass => Column::AccountClass,
            AggregationDimension::Adid => Column::Adid,
            AggregationDimension::Staff => Column::StaffId,
            AggregationDimension::SmerSegment => Column::SmerSegment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aged_debt_sums_outstanding_only() {
        assert_eq!(ViewPolicy::AgedDebt.measures(), &[Measure::OutstandingAmount]);
        assert!(!ViewPolicy::AgedDebt.includes(Measure::TotalUnpaid));
    }

    #[test]
    fn trade_receivable_measures_follow_output_order() {
        let names: Vec<_> = ViewPolicy::TradeReceivable
            .measures()
            .iter()
            .map(|m| m.field_name())
            .collect();
        assert_eq!(
            names,
            vec![
                "totalUndue",
                "currentMonthUnpaid",
                "outstandingAmount",
                "totalUnpaid"
            ]
        );
    }

    #[test]
    fn percentage_base_table() {
        let expected = [
            (ViewPolicy::AgedDebt, AggregationDimension::Station, Measure::OutstandingAmount),
            (ViewPolicy::AgedDebt, AggregationDimension::AccountClass, Measure::OutstandingAmount),
            (ViewPolicy::AgedDebt, AggregationDimension::Adid, Measure::OutstandingAmount),
            (ViewPolicy::AgedDebt, AggregationDimension::Staff, Measure::OutstandingAmount),
            (ViewPolicy::AgedDebt, AggregationDimension::SmerSegment, Measure::OutstandingAmount),
            (ViewPolicy::TradeReceivable, AggregationDimension::Station, Measure::OutstandingAmount),
            (ViewPolicy::TradeReceivable, AggregationDimension::AccountClass, Measure::OutstandingAmount),
            (ViewPolicy::TradeReceivable, AggregationDimension::Adid, Measure::OutstandingAmount),
            (ViewPolicy::TradeReceivable, AggregationDimension::Staff, Measure::OutstandingAmount),
            (ViewPolicy::TradeReceivable, AggregationDimension::SmerSegment, Measure::OutstandingAmount),
        ];
        for (view, dimension, measure) in expected {
            assert_eq!(view.percentage_base(dimension), measure, "{view} / {dimension}");
            assert!(view.includes(measure));
        }
    }

    #[test]
    fn measure_sums_merge_and_add() {
        let mut left = MeasureSums::default();
        left.add(Measure::OutstandingAmount, 10.0);
        let mut right = MeasureSums::default();
        right.add(Measure::OutstandingAmount, 5.5);
        right.add(Measure::TotalUnpaid, 2.0);
        left.merge(&right);
        assert_eq!(left.get(Measure::OutstandingAmount), 15.5);
        assert_eq!(left.get(Measure::TotalUnpaid), 2.0);
    }

    #[test]
    fn dimension_tags_round_trip() {
        for dimension in AggregationDimension::all() {
            let parsed: AggregationDimension = dimension.to_string().parse().expect("parses");
            assert_eq!(parsed, dimension);
        }
        assert!("Region".parse::<AggregationDimension>().is_err());
    }
}

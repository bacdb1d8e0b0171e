use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One row of a debt ledger dataset. Owned by the row source and never
/// mutated by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtRecord {
    /// Load-order ordinal assigned by the row source; unique per dataset.
    pub row_id: u64,
    /// Natural identifier of the contract account.
    pub account_id: String,
    pub business_area: String,
    pub account_class: String,
    pub adid: String,
    pub account_status: String,
    pub staff_id: String,
    #[serde(default)]
    pub smer_segment: Option<String>,
    #[serde(default)]
    pub months_outstanding: Option<f64>,
    pub outstanding_amount: f64,
    pub total_undue: f64,
    pub current_month_unpaid: f64,
    pub total_unpaid: f64,
    #[serde(default)]
    pub mit_amount: Option<f64>,
}

impl DebtRecord {
    pub fn new(
        account_id: impl Into<String>,
        business_area: impl Into<String>,
        account_class: impl Into<String>,
        outstanding_amount: f64,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            business_area: business_area.into(),
            account_class: account_class.into(),
            outstanding_amount,
            ..Self::default()
        }
    }

    /// Stable listing key: identifier first, load ordinal as tie-breaker.
    pub fn sort_key(&self) -> SortKey {
        SortKey {
            account_id: self.account_id.clone(),
            row_id: self.row_id,
        }
    }

    /// Copies only the requested columns; the rest keep their defaults.
    pub fn project(&self, columns: &ColumnSet) -> DebtRecord {
        let mut out = DebtRecord {
            row_id: self.row_id,
            ..DebtRecord::default()
        };
        for column in columns {
            match column {
                Column::RowId => {}
                Column::AccountId => out.account_id = self.account_id.clone(),
                Column::BusinessArea => out.business_area = self.business_area.clone(),
                Column::AccountClass => out.account_class = self.account_class.clone(),
                Column::Adid => out.adid = self.adid.clone(),
                Column::AccountStatus => out.account_status = self.account_status.clone(),
                Column::StaffId => out.staff_id = self.staff_id.clone(),
                Column::SmerSegment => out.smer_segment = self.smer_segment.clone(),
                Column::MonthsOutstanding => out.months_outstanding = self.months_outstanding,
                Column::OutstandingAmount => out.outstanding_amount = self.outstanding_amount,
                Column::TotalUndue => out.total_undue = self.total_undue,
                Column::CurrentMonthUnpaid => out.current_month_unpaid = self.current_month_unpaid,
                Column::TotalUnpaid => out.total_unpaid = self.total_unpaid,
                Column::MitAmount => out.mit_amount = self.mit_amount,
            }
        }
        out
    }
}

/// Columns a row source can project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    RowId,
    AccountId,
    BusinessArea,
    AccountClass,
    Adid,
    AccountStatus,
    StaffId,
    SmerSegment,
    MonthsOutstanding,
    OutstandingAmount,
    TotalUndue,
    CurrentMonthUnpaid,
    TotalUnpaid,
    MitAmount,
}

pub type ColumnSet = BTreeSet<Column>;

impl Column {
    pub const ALL: [Column; 14] = [
        Column::RowId,
        Column::AccountId,
        Column::BusinessArea,
        Column::AccountClass,
        Column::Adid,
        Column::AccountStatus,
        Column::StaffId,
        Column::SmerSegment,
        Column::MonthsOutstanding,
        Column::OutstandingAmount,
        Column::TotalUndue,
        Column::CurrentMonthUnpaid,
        Column::TotalUnpaid,
        Column::MitAmount,
    ];

    pub fn all() -> ColumnSet {
        Self::ALL.into_iter().collect()
    }
}

/// Position of a record in listing order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    pub account_id: String,
    pub row_id: u64,
}

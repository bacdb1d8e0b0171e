//! Typed row predicates and the builder that derives them from a
//! [`FilterSpec`].
//!
//! Each filter clause becomes one [`Predicate`] variant so clauses can be
//! evaluated, described and tested on their own. Absent filter fields add no
//! clause at all.

use std::{collections::BTreeSet, fmt};

use crate::core::catalog::DimensionCatalog;
use crate::domain::{
    AccountClassType, AgingBucket, BalanceSign, Column, ColumnSet, DebtRecord, FilterSpec,
    MitType, SortKey,
};
use crate::errors::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record.
    All,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    AccountClassIn(BTreeSet<String>),
    AccountClassEq(String),
    BusinessAreaIn(BTreeSet<String>),
    AdidIn(BTreeSet<String>),
    AccountStatusEq(String),
    /// `mitAmount != 0`.
    MitNonZero,
    /// `mitAmount == 0` or absent.
    MitZeroOrAbsent,
    Balance(BalanceSign),
    Aging(AgingBucket),
    /// Inclusive on both ends.
    OutstandingBetween { min: f64, max: f64 },
    SmerSegmentIn(BTreeSet<String>),
    /// Segment is absent or whitespace.
    SmerSegmentBlank,
    SortKeyAfter(SortKey),
    SortKeyBefore(SortKey),
}

impl Predicate {
    /// Conjunction that flattens nested `And`s and drops `All`.
    pub fn and(clauses: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut flat = Vec::new();
        for clause in clauses {
            match clause {
                Predicate::All => {}
                Predicate::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        match flat.len() {
            0 => Predicate::All,
            1 => flat.pop().unwrap_or(Predicate::All),
            _ => Predicate::And(flat),
        }
    }

    pub fn or(clauses: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut flat: Vec<Predicate> = clauses.into_iter().collect();
        if flat.iter().any(|clause| matches!(clause, Predicate::All)) {
            return Predicate::All;
        }
        match flat.len() {
            1 => flat.pop().unwrap_or(Predicate::All),
            _ => Predicate::Or(flat),
        }
    }

    pub fn matches(&self, record: &DebtRecord) -> bool {
        match self {
            Predicate::All => true,
            Predicate::And(clauses) => clauses.iter().all(|clause| clause.matches(record)),
            Predicate::Or(clauses) => clauses.iter().any(|clause| clause.matches(record)),
            Predicate::AccountClassIn(codes) => codes.contains(record.account_class.trim()),
            Predicate::AccountClassEq(code) => record.account_class.trim() == code,
            Predicate::BusinessAreaIn(codes) => codes.contains(record.business_area.trim()),
            Predicate::AdidIn(codes) => codes.contains(record.adid.trim()),
            Predicate::AccountStatusEq(status) => record.account_status.trim() == status,
            Predicate::MitNonZero => record.mit_amount.map_or(false, |amount| amount != 0.0),
            Predicate::MitZeroOrAbsent => record.mit_amount.map_or(true, |amount| amount == 0.0),
            Predicate::Balance(sign) => sign.admits(record.outstanding_amount),
            Predicate::Aging(bucket) => record
                .months_outstanding
                .map_or(false, |months| bucket.contains(months)),
            Predicate::OutstandingBetween { min, max } => {
                record.outstanding_amount >= *min && record.outstanding_amount <= *max
            }
            Predicate::SmerSegmentIn(codes) => record
                .smer_segment
                .as_deref()
                .map_or(false, |segment| codes.contains(segment.trim())),
            Predicate::SmerSegmentBlank => record
                .smer_segment
                .as_deref()
                .map_or(true, |segment| segment.trim().is_empty()),
            Predicate::SortKeyAfter(key) => record.sort_key() > *key,
            Predicate::SortKeyBefore(key) => record.sort_key() < *key,
        }
    }

    /// Columns the predicate reads.
    pub fn columns(&self) -> ColumnSet {
        let mut columns = ColumnSet::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns(&self, out: &mut ColumnSet) {
        match self {
            Predicate::All => {}
            Predicate::And(clauses) | Predicate::Or(clauses) => {
                for clause in clauses {
                    clause.collect_columns(out);
                }
            }
            Predicate::AccountClassIn(_) | Predicate::AccountClassEq(_) => {
                out.insert(Column::AccountClass);
            }
            Predicate::BusinessAreaIn(_) => {
                out.insert(Column::BusinessArea);
            }
            Predicate::AdidIn(_) => {
                out.insert(Column::Adid);
            }
            Predicate::AccountStatusEq(_) => {
                out.insert(Column::AccountStatus);
            }
            Predicate::MitNonZero | Predicate::MitZeroOrAbsent => {
                out.insert(Column::MitAmount);
            }
            Predicate::Balance(_) | Predicate::OutstandingBetween { .. } => {
                out.insert(Column::OutstandingAmount);
            }
            Predicate::Aging(_) => {
                out.insert(Column::MonthsOutstanding);
            }
            Predicate::SmerSegmentIn(_) | Predicate::SmerSegmentBlank => {
                out.insert(Column::SmerSegment);
            }
            Predicate::SortKeyAfter(_) | Predicate::SortKeyBefore(_) => {
                out.insert(Column::AccountId);
                out.insert(Column::RowId);
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, clauses: &[Predicate], op: &str) -> fmt::Result {
            f.write_str("(")?;
            for (idx, clause) in clauses.iter().enumerate() {
                if idx > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", clause)?;
            }
            f.write_str(")")
        }
        fn set(codes: &BTreeSet<String>) -> String {
            codes.iter().cloned().collect::<Vec<_>>().join(", ")
        }

        match self {
            Predicate::All => f.write_str("true"),
            Predicate::And(clauses) => join(f, clauses, "AND"),
            Predicate::Or(clauses) => join(f, clauses, "OR"),
            Predicate::AccountClassIn(codes) => write!(f, "accountClass IN [{}]", set(codes)),
            Predicate::AccountClassEq(code) => write!(f, "accountClass = {}", code),
            Predicate::BusinessAreaIn(codes) => write!(f, "businessArea IN [{}]", set(codes)),
            Predicate::AdidIn(codes) => write!(f, "adid IN [{}]", set(codes)),
            Predicate::AccountStatusEq(status) => write!(f, "accountStatus = {}", status),
            Predicate::MitNonZero => f.write_str("mitAmount != 0"),
            Predicate::MitZeroOrAbsent => f.write_str("mitAmount = 0 OR mitAmount IS NULL"),
            Predicate::Balance(sign) => write!(f, "balance IS {}", sign),
            Predicate::Aging(bucket) => write!(f, "monthsOutstanding IN {}", bucket),
            Predicate::OutstandingBetween { min, max } => {
                write!(f, "outstandingAmount BETWEEN {} AND {}", min, max)
            }
            Predicate::SmerSegmentIn(codes) => write!(f, "smerSegment IN [{}]", set(codes)),
            Predicate::SmerSegmentBlank => f.write_str("smerSegment IS BLANK"),
            Predicate::SortKeyAfter(key) => {
                write!(f, "sortKey > ({}, {})", key.account_id, key.row_id)
            }
            Predicate::SortKeyBefore(key) => {
                write!(f, "sortKey < ({}, {})", key.account_id, key.row_id)
            }
        }
    }
}

/// Derives predicates from filter specifications using catalog tables.
pub struct PredicateBuilder<'a> {
    catalog: &'a DimensionCatalog,
}

impl<'a> PredicateBuilder<'a> {
    pub fn new(catalog: &'a DimensionCatalog) -> Self {
        Self { catalog }
    }

    /// Validates `filter` and returns the conjunction of its clauses.
    pub fn build(&self, filter: &FilterSpec) -> Result<Predicate> {
        filter.validate()?;
        let filter = filter.normalized();
        let mut clauses = Vec::new();

        match filter.account_class_type {
            AccountClassType::All => {}
            AccountClassType::Government => clauses.push(Predicate::AccountClassIn(
                self.catalog.government_classes().clone(),
            )),
            AccountClassType::NonGovernment => clauses.push(Predicate::AccountClassIn(
                self.catalog.non_government_classes().clone(),
            )),
        }

        match filter.mit_type {
            MitType::All => {}
            MitType::Mit => clauses.push(Predicate::MitNonZero),
            MitType::NonMit => clauses.push(Predicate::MitZeroOrAbsent),
        }

        if !filter.business_areas.is_empty() {
            clauses.push(Predicate::BusinessAreaIn(filter.business_areas.clone()));
        }
        if !filter.adids.is_empty() {
            clauses.push(Predicate::AdidIn(filter.adids.clone()));
        }
        if let Some(status) = filter.account_status.clone() {
            clauses.push(Predicate::AccountStatusEq(status));
        }
        if let Some(sign) = filter.balance_sign {
            clauses.push(Predicate::Balance(sign));
        }
        if let Some(class) = filter.account_class.clone() {
            clauses.push(Predicate::AccountClassEq(class));
        }
        if let Some(bucket) = filter.aging_bucket {
            clauses.push(Predicate::Aging(bucket));
        }
        match filter.outstanding_range.as_ref() {
            Some(range) => match range.numeric_bounds() {
                Some((min, max)) => clauses.push(Predicate::OutstandingBetween { min, max }),
                None => tracing::debug!(?range, "non-numeric outstanding range ignored"),
            },
            None => {}
        }
        if !filter.smer_segments.is_empty() {
            clauses.push(self.segment_clause(&filter.smer_segments));
        }

        Ok(Predicate::and(clauses))
    }

    fn segment_clause(&self, segments: &BTreeSet<String>) -> Predicate {
        let blanks = self.catalog.blank_segment_label();
        let wants_blanks = segments.contains(blanks);
        let codes: BTreeSet<String> = segments
            .iter()
            .filter(|code| code.as_str() != blanks)
            .cloned()
            .collect();

        let mut options = Vec::new();
        if !codes.is_empty() {
            options.push(Predicate::SmerSegmentIn(codes));
        }
        if wants_blanks {
            options.push(Predicate::SmerSegmentBlank);
        }
        Predicate::or(options)
    }
}

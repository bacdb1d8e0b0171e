use colored::Colorize;
use std::fmt;

use crate::core::response::{MeasureFields, RollupResponse, TotalMeasureFields};
use crate::domain::{AggregationDimension, Measure, ViewPolicy};

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Section,
}

fn apply_style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Info => format!("INFO: {text}"),
        MessageKind::Success => format!("SUCCESS: {text}").bright_green().to_string(),
        MessageKind::Warning => format!("WARNING: {text}").bright_yellow().to_string(),
        MessageKind::Error => format!("ERROR: {text}").bright_red().to_string(),
        MessageKind::Section => format!("=== {} ===", text.trim()).bold().to_string(),
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = apply_style(kind, message);
    match kind {
        MessageKind::Section => println!("\n{}", formatted),
        MessageKind::Error => eprintln!("{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Role of a rendered table line; decides its styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Row,
    Subtotal,
    GrandTotal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLine {
    pub kind: LineKind,
    pub text: String,
}

const STATION_WIDTH: usize = 14;
const VALUE_WIDTH: usize = 14;
const COUNT_WIDTH: usize = 9;
const AMOUNT_WIDTH: usize = 18;
const PERCENT_WIDTH: usize = 8;

fn measure_label(measure: Measure) -> &'static str {
    match measure {
        Measure::TotalUndue => "Total Undue",
        Measure::CurrentMonthUnpaid => "Month Unpaid",
        Measure::OutstandingAmount => "Outstanding",
        Measure::TotalUnpaid => "Total Unpaid",
    }
}

fn row_measure(fields: &MeasureFields, measure: Measure) -> Option<f64> {
    match measure {
        Measure::TotalUndue => fields.total_undue,
        Measure::CurrentMonthUnpaid => fields.current_month_unpaid,
        Measure::OutstandingAmount => fields.outstanding_amount,
        Measure::TotalUnpaid => fields.total_unpaid,
    }
}

fn total_measure(fields: &TotalMeasureFields, measure: Measure) -> Option<f64> {
    match measure {
        Measure::TotalUndue => fields.total_undue,
        Measure::CurrentMonthUnpaid => fields.current_month_unpaid,
        Measure::OutstandingAmount => fields.outstanding_amount,
        Measure::TotalUnpaid => fields.total_unpaid,
    }
}

fn amounts(values: impl Iterator<Item = Option<f64>>) -> String {
    values
        .map(|value| match value {
            Some(amount) => format!("{:>AMOUNT_WIDTH$.2}", amount),
            None => format!("{:>AMOUNT_WIDTH$}", "-"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lays a rollup response out as fixed-width lines: every station's rows
/// followed by its subtotal, then the grand total.
pub fn rollup_table(
    response: &RollupResponse,
    view: ViewPolicy,
    dimension: AggregationDimension,
) -> Vec<TableLine> {
    let measures = view.measures();
    let mut lines = Vec::new();
    let headers = measures
        .iter()
        .map(|measure| format!("{:>AMOUNT_WIDTH$}", measure_label(*measure)))
        .collect::<Vec<_>>()
        .join(" ");
    lines.push(TableLine {
        kind: LineKind::Header,
        text: format!(
            "{:<STATION_WIDTH$} {:<VALUE_WIDTH$} {:>COUNT_WIDTH$} {} {:>PERCENT_WIDTH$}",
            "Station",
            dimension.to_string(),
            "Accounts",
            headers,
            "%"
        ),
    });

    for total in &response.parent_totals {
        for row in response
            .rows
            .iter()
            .filter(|row| row.business_area == total.business_area)
        {
            lines.push(TableLine {
                kind: LineKind::Row,
                text: format!(
                    "{:<STATION_WIDTH$} {:<VALUE_WIDTH$} {:>COUNT_WIDTH$} {} {:>PERCENT_WIDTH$}",
                    row.station,
                    row.dimension_value,
                    row.number_of_accounts,
                    amounts(measures.iter().map(|m| row_measure(&row.measures, *m))),
                    row.percent_of_total
                ),
            });
        }
        lines.push(TableLine {
            kind: LineKind::Subtotal,
            text: format!(
                "{:<STATION_WIDTH$} {:<VALUE_WIDTH$} {:>COUNT_WIDTH$} {} {:>PERCENT_WIDTH$}",
                total.station,
                "Subtotal",
                total.total_number_of_accounts,
                amounts(measures.iter().map(|m| total_measure(&total.measures, *m))),
                total.total_percent_of_total
            ),
        });
    }

    let grand = &response.grand_total;
    lines.push(TableLine {
        kind: LineKind::GrandTotal,
        text: format!(
            "{:<STATION_WIDTH$} {:<VALUE_WIDTH$} {:>COUNT_WIDTH$} {} {:>PERCENT_WIDTH$}",
            "Grand Total",
            "",
            grand.total_number_of_accounts,
            amounts(measures.iter().map(|m| total_measure(&grand.measures, *m))),
            grand.total_percent_of_total
        ),
    });
    lines
}

pub fn print_table(lines: &[TableLine]) {
    for line in lines {
        let styled = match line.kind {
            LineKind::Header => line.text.bold().underline().to_string(),
            LineKind::Row => line.text.clone(),
            LineKind::Subtotal => line.text.bright_cyan().to_string(),
            LineKind::GrandTotal => line.text.bold().bright_green().to_string(),
        };
        println!("{}", styled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        aggregator::DimensionAggregator, catalog::DimensionCatalog, response::ResponseAssembler,
        rollup::RollupComposer,
    };
    use crate::domain::{DebtRecord, FilterSpec};

    #[test]
    fn table_interleaves_rows_and_subtotals() {
        let catalog = DimensionCatalog::standard();
        let dimension = AggregationDimension::AccountClass;
        let view = ViewPolicy::AgedDebt;
        let mut aggregator = DimensionAggregator::new(&catalog, dimension, view);
        aggregator.push(&DebtRecord::new("A", "6210", "LPCG", 10.0));
        aggregator.push(&DebtRecord::new("B", "6211", "OPCN", 30.0));
        let result = RollupComposer::new(&catalog, dimension, view)
            .compose(aggregator.finish(), &FilterSpec::new());
        let response = ResponseAssembler::assemble(&result);

        let lines = rollup_table(&response, view, dimension);
        let kinds: Vec<LineKind> = lines.iter().map(|line| line.kind).collect();
        assert_eq!(kinds[0], LineKind::Header);
        assert_eq!(*kinds.last().unwrap(), LineKind::GrandTotal);
        assert_eq!(
            kinds.iter().filter(|kind| **kind == LineKind::Subtotal).count(),
            2
        );
        assert!(lines[0].text.contains("AccountClass"));
        assert!(lines[0].text.contains("Outstanding"));
        assert!(!lines[0].text.contains("Total Undue"));
        assert!(lines[1].text.starts_with("Metro North"));
        assert!(lines.last().unwrap().text.trim_end().ends_with("100.00"));
    }
}

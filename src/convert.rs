// Converter presets: turn a bank's own export columns into canonical rows.
//
// Each converter knows one bank's layout; adding a bank means implementing
// the trait, not touching the others. Converted output is a csv the ledger
// can load directly.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use crate::error::ConvertError;

/// A raw export row, keyed by the source's own column headings.
pub type RawRow = BTreeMap<String, String>;

fn field<'a>(row: &'a RawRow, name: &str) -> Result<&'a str, ConvertError> {
    row.get(name)
        .map(String::as_str)
        .ok_or_else(|| ConvertError::MissingColumn(name.to_string()))
}

/// Strip currency symbols and thousands separators.
fn clean_amount(raw: &str) -> String {
    raw.replace(['$', ','], "")
}

/// Converts one source's rows into canonical `date,src,dest,...` rows.
pub trait RowConverter: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Header row of the converted output.
    fn headings(&self) -> &'static str;

    /// Convert one row into the fields matching `headings`.
    fn convert_row(&self, row: &RawRow) -> Result<Vec<String>, ConvertError>;
}

/// Look up a converter by name.
pub fn converter(name: &str) -> Option<Box<dyn RowConverter>> {
    converters().into_iter().find(|c| c.name() == name)
}

/// Every built-in converter.
pub fn converters() -> Vec<Box<dyn RowConverter>> {
    vec![
        Box::new(SchwabChecking),
        Box::new(SchwabBrokerage),
        Box::new(UsaaGeneral),
    ]
}

// ============================================================================
// PRESETS
// ============================================================================

/// Schwab checking exports:
///
///     "Date","Type","Check #","Description","Withdrawal (-)","Deposit (+)","RunningBalance"
///     "01/17/2023","TRANSFER","","Funds Transfer","$5,000.00","","$0.00"
pub struct SchwabChecking;

impl RowConverter for SchwabChecking {
    fn name(&self) -> &'static str {
        "schwab-checking"
    }

    fn description(&self) -> &'static str {
        "Schwab checking accounts."
    }

    fn headings(&self) -> &'static str {
        "date,dest,notes,amount"
    }

    fn convert_row(&self, row: &RawRow) -> Result<Vec<String>, ConvertError> {
        let date = field(row, "Date")?;
        let description = field(row, "Description")?;

        let withdrawal = field(row, "Withdrawal (-)")?;
        let deposit = field(row, "Deposit (+)")?;
        let amount = if withdrawal.is_empty() {
            deposit.to_string()
        } else {
            format!("-{withdrawal}")
        };

        Ok(vec![
            date.to_string(),
            description.to_string(),
            description.to_string(),
            clean_amount(&amount),
        ])
    }
}

/// Schwab brokerage exports:
///
///     "Date","Action","Symbol","Description","Quantity","Price","Fees & Comm","Amount"
///     "01/17/2023","Buy","SWPPX","SCHWAB S&P 500 INDEX","100.000","$50.00","","-$5000.00"
pub struct SchwabBrokerage;

impl RowConverter for SchwabBrokerage {
    fn name(&self) -> &'static str {
        "schwab-brokerage"
    }

    fn description(&self) -> &'static str {
        "Schwab brokerage accounts."
    }

    fn headings(&self) -> &'static str {
        "date,dest,notes,amount"
    }

    fn convert_row(&self, row: &RawRow) -> Result<Vec<String>, ConvertError> {
        let date = field(row, "Date")?;
        let description = field(row, "Description")?;
        let action = field(row, "Action")?;

        // a buy stays within the account: cash out, shares in
        let dest = if action == "Buy" { "this" } else { description };

        let mut amount = clean_amount(field(row, "Amount")?);
        let symbol = field(row, "Symbol")?;
        let quantity = field(row, "Quantity")?;
        if !symbol.is_empty() {
            amount = format!("{amount}:usd {symbol}:{quantity}");
        }

        Ok(vec![
            date.to_string(),
            dest.to_string(),
            description.to_string(),
            amount,
        ])
    }
}

/// USAA checking, savings, and credit cards:
///
///     Date,Description,Original Description,Category,Amount,Status
///     2023-07-21,"Mr Bobs Auto","MR BOBS AUTO SHOP",Auto,-33.69,Posted
pub struct UsaaGeneral;

impl RowConverter for UsaaGeneral {
    fn name(&self) -> &'static str {
        "usaa-general"
    }

    fn description(&self) -> &'static str {
        "USAA checking, savings, and credit cards."
    }

    fn headings(&self) -> &'static str {
        "date,dest,notes,amount"
    }

    fn convert_row(&self, row: &RawRow) -> Result<Vec<String>, ConvertError> {
        Ok(vec![
            field(row, "Date")?.to_string(),
            field(row, "Original Description")?.to_string(),
            field(row, "Description")?.to_string(),
            field(row, "Amount")?.to_string(),
        ])
    }
}

// ============================================================================
// DRIVERS
// ============================================================================

/// Convert csv text. The output starts with the converter's headings.
pub fn convert_str(text: &str, conv: &dyn RowConverter) -> Result<String, ConvertError> {
    let mut out = vec![conv.headings().to_string()];
    convert_reader(text.as_bytes(), conv, &mut out)?;
    Ok(out.join("\n"))
}

/// Convert csv files. The output starts with the converter's headings.
pub fn convert_files<P: AsRef<Path>>(
    paths: &[P],
    conv: &dyn RowConverter,
) -> Result<String, ConvertError> {
    let mut out = vec![conv.headings().to_string()];
    for path in paths {
        let file = File::open(path)?;
        convert_reader(file, conv, &mut out)?;
    }
    Ok(out.join("\n"))
}

fn convert_reader<R: std::io::Read>(
    reader: R,
    conv: &dyn RowConverter,
    out: &mut Vec<String>,
) -> Result<(), ConvertError> {
    let mut reader = ReaderBuilder::new().from_reader(reader);
    let headers = reader.headers()?.clone();

    for record in reader.records() {
        let record = record?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();

        let fields = conv.convert_row(&row)?;
        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .from_writer(Vec::new());
        wtr.write_record(&fields)?;
        let bytes = wtr
            .into_inner()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        out.push(String::from_utf8_lossy(&bytes).trim_end().to_string());
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

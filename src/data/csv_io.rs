//! CSV loaders for sales and customer tables.
//!
//! Required columns must be present (otherwise [`AnalyticsError::SchemaMismatch`]
//! names the first missing one). Optional columns are filled and listed in
//! the dataset's `filled_columns`.
//!
//! Cells are validated at the boundary: amounts must be finite and
//! non-negative, rates must lie in [0, 1], and dates and customer ids must
//! be unique. Violations are reported as [`AnalyticsError::Parse`] with the
//! 1-based data row and the column name.

use crate::core::{customer_value, CustomerRecord, SalesRecord};
use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

const SALES_REQUIRED: [&str; 2] = ["date", "sales"];
const SALES_OPTIONAL: [&str; 6] = [
    "is_holiday",
    "is_promotion",
    "weekday",
    "month",
    "year",
    "is_weekend",
];
const CUSTOMER_REQUIRED: [&str; 4] = [
    "customer_id",
    "avg_purchase_value",
    "purchase_frequency",
    "return_rate",
];
/// Upper bound of each required numeric customer column.
const CUSTOMER_REQUIRED_MAX: [f64; 3] = [f64::INFINITY, f64::INFINITY, 1.0];

/// Sales rows sorted by date.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesDataset {
    pub records: Vec<SalesRecord>,
    /// Optional columns absent from the input.
    pub filled_columns: Vec<String>,
}

/// Customer rows in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerDataset {
    pub customers: Vec<CustomerRecord>,
    /// Optional columns absent from the input.
    pub filled_columns: Vec<String>,
}

impl CustomerDataset {
    /// Whether `column` was synthesized rather than read.
    pub fn was_filled(&self, column: &str) -> bool {
        self.filled_columns.iter().any(|c| c == column)
    }
}

/// Load a sales CSV from disk.
pub fn load_sales_csv(path: impl AsRef<Path>) -> Result<SalesDataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| AnalyticsError::io(path.display(), e))?;
    let dataset = read_sales_csv(BufReader::new(file))?;
    info!(
        path = %path.display(),
        rows = dataset.records.len(),
        filled = ?dataset.filled_columns,
        "loaded sales data"
    );
    Ok(dataset)
}

/// Parse a sales table.
///
/// Calendar columns (`weekday`, `month`, `year`, `is_weekend`) are always
/// recomputed from `date`; the flags default to false when absent.
pub fn read_sales_csv<R: Read>(reader: R) -> Result<SalesDataset> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = Headers::read(&mut reader)?;

    let date_idx = headers.require(SALES_REQUIRED[0])?;
    let sales_idx = headers.require(SALES_REQUIRED[1])?;
    let holiday_idx = headers.find("is_holiday");
    let promotion_idx = headers.find("is_promotion");
    let filled_columns = headers.missing(&SALES_OPTIONAL);

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for (i, row) in reader.records().enumerate() {
        let row_no = i + 1;
        let row = row.map_err(|e| AnalyticsError::io("<sales csv>", e))?;
        let date = parse_date(cell(&row, date_idx), row_no)?;
        if !seen.insert(date) {
            return Err(AnalyticsError::Parse {
                row: row_no,
                column: "date".into(),
                detail: format!("duplicate date {date}"),
            });
        }
        let sales = parse_bounded(cell(&row, sales_idx), row_no, "sales", f64::INFINITY)?;
        let is_holiday = holiday_idx
            .map(|idx| parse_bool(cell(&row, idx), row_no, "is_holiday"))
            .transpose()?
            .unwrap_or(false);
        let is_promotion = promotion_idx
            .map(|idx| parse_bool(cell(&row, idx), row_no, "is_promotion"))
            .transpose()?
            .unwrap_or(false);
        records.push(SalesRecord::new(date, sales, is_holiday, is_promotion));
    }
    records.sort_by_key(|r| r.date);

    debug!(rows = records.len(), "parsed sales table");
    Ok(SalesDataset {
        records,
        filled_columns,
    })
}

/// Load a customer CSV from disk; `seed` drives the optional-column fallback.
pub fn load_customer_csv(path: impl AsRef<Path>, seed: u64) -> Result<CustomerDataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| AnalyticsError::io(path.display(), e))?;
    let dataset = read_customer_csv(BufReader::new(file), seed)?;
    info!(
        path = %path.display(),
        rows = dataset.customers.len(),
        filled = ?dataset.filled_columns,
        "loaded customer data"
    );
    Ok(dataset)
}

/// Parse a customer table.
///
/// Missing `loyalty_years`, `avg_basket_size` and `pct_discount_used` are
/// drawn uniformly from U(0,10), U(1,15) and U(0,0.7) in that column order;
/// a missing `customer_value` is derived from the other fields.
pub fn read_customer_csv<R: Read>(reader: R, seed: u64) -> Result<CustomerDataset> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = Headers::read(&mut reader)?;

    let required: Vec<usize> = CUSTOMER_REQUIRED
        .iter()
        .map(|c| headers.require(c))
        .collect::<Result<_>>()?;
    // (column, fallback low, fallback high, accepted max)
    let optional = [
        ("loyalty_years", 0.0, 10.0, f64::INFINITY),
        ("avg_basket_size", 1.0, 15.0, f64::INFINITY),
        ("pct_discount_used", 0.0, 0.7, 1.0),
    ];
    let optional_idx: Vec<Option<usize>> =
        optional.iter().map(|(name, ..)| headers.find(name)).collect();
    let value_idx = headers.find("customer_value");

    let mut rows: Vec<(String, [f64; 3], [Option<f64>; 3], Option<f64>)> = Vec::new();
    let mut seen = HashSet::new();
    for (i, row) in reader.records().enumerate() {
        let row_no = i + 1;
        let row = row.map_err(|e| AnalyticsError::io("<customer csv>", e))?;
        let id = cell(&row, required[0]).trim().to_string();
        if id.is_empty() {
            return Err(AnalyticsError::Parse {
                row: row_no,
                column: "customer_id".into(),
                detail: "empty identifier".into(),
            });
        }
        if seen.contains(&id) {
            return Err(AnalyticsError::Parse {
                row: row_no,
                column: "customer_id".into(),
                detail: format!("duplicate identifier '{id}'"),
            });
        }
        let mut numeric = [0.0; 3];
        for (slot, ((&idx, name), &max)) in numeric.iter_mut().zip(
            required[1..]
                .iter()
                .zip(&CUSTOMER_REQUIRED[1..])
                .zip(&CUSTOMER_REQUIRED_MAX),
        ) {
            *slot = parse_bounded(cell(&row, idx), row_no, name, max)?;
        }
        let mut extra = [None; 3];
        for (slot, (idx, (name, _, _, max))) in extra.iter_mut().zip(optional_idx.iter().zip(&optional)) {
            *slot = idx
                .map(|idx| parse_bounded(cell(&row, idx), row_no, name, *max))
                .transpose()?;
        }
        let value = value_idx
            .map(|idx| parse_bounded(cell(&row, idx), row_no, "customer_value", f64::INFINITY))
            .transpose()?;
        seen.insert(id.clone());
        rows.push((id, numeric, extra, value));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut filled_columns = Vec::new();
    let mut fallback: Vec<Vec<f64>> = Vec::with_capacity(optional.len());
    for ((name, low, high, _), idx) in optional.iter().zip(&optional_idx) {
        if idx.is_some() {
            fallback.push(Vec::new());
        } else {
            filled_columns.push(name.to_string());
            fallback.push(
                Uniform::new(*low, *high)
                    .sample_iter(&mut rng)
                    .take(rows.len())
                    .collect(),
            );
        }
    }
    if value_idx.is_none() {
        filled_columns.push("customer_value".to_string());
    }

    let customers = rows
        .into_iter()
        .enumerate()
        .map(|(i, (id, [apv, freq, rr], extra, value))| {
            let pick = |k: usize| extra[k].unwrap_or_else(|| fallback[k][i]);
            let (loyalty, basket, discount) = (pick(0), pick(1), pick(2));
            CustomerRecord {
                customer_id: id,
                avg_purchase_value: apv,
                purchase_frequency: freq,
                return_rate: rr,
                loyalty_years: loyalty,
                avg_basket_size: basket,
                pct_discount_used: discount,
                customer_value: value.unwrap_or_else(|| customer_value(apv, freq, rr, loyalty)),
            }
        })
        .collect::<Vec<_>>();

    debug!(rows = customers.len(), "parsed customer table");
    Ok(CustomerDataset {
        customers,
        filled_columns,
    })
}

/// Header positions of a CSV table.
struct Headers(Vec<String>);

impl Headers {
    fn read<R: Read>(reader: &mut csv::Reader<R>) -> Result<Self> {
        let headers = reader
            .headers()
            .map_err(|e| AnalyticsError::io("<csv header>", e))?;
        Ok(Self(headers.iter().map(|h| h.trim().to_string()).collect()))
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|h| h == name)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.find(name)
            .ok_or_else(|| AnalyticsError::missing_column(name))
    }

    fn missing(&self, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .filter(|n| self.find(n).is_none())
            .map(|n| n.to_string())
            .collect()
    }
}

fn cell(row: &csv::StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or("").trim()
}

pub(crate) fn parse_f64(raw: &str, row: usize, column: &str) -> Result<f64> {
    raw.parse::<f64>().map_err(|e| AnalyticsError::Parse {
        row,
        column: column.to_string(),
        detail: format!("'{}': {}", raw, e),
    })
}

/// Parse a finite value in `[0, max]`.
fn parse_bounded(raw: &str, row: usize, column: &str, max: f64) -> Result<f64> {
    let value = parse_f64(raw, row, column)?;
    if !value.is_finite() || value < 0.0 || value > max {
        let range = if max.is_finite() {
            format!("[0, {max}]")
        } else {
            "[0, inf)".to_string()
        };
        return Err(AnalyticsError::Parse {
            row,
            column: column.to_string(),
            detail: format!("{raw} is outside {range}"),
        });
    }
    Ok(value)
}

pub(crate) fn parse_bool(raw: &str, row: usize, column: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" | "yes" => Ok(true),
        "false" | "0" | "0.0" | "no" | "" => Ok(false),
        _ => Err(AnalyticsError::Parse {
            row,
            column: column.to_string(),
            detail: format!("'{}' is not a boolean", raw),
        }),
    }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
pub(crate) fn parse_date(raw: &str, row: usize) -> Result<NaiveDate> {
    let day = raw.split(|c| c == ' ' || c == 'T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| AnalyticsError::Parse {
        row,
        column: "date".to_string(),
        detail: format!("'{}': {}", raw, e),
    })
}

//! Conversions between domain records and [`Table`]s.

use super::table::Table;
use crate::core::{CustomerRecord, Forecast, ForecastPoint, SalesRecord};
use crate::data::csv_io::{parse_bool, parse_date, parse_f64};
use crate::error::{AnalyticsError, Result};
use chrono::NaiveDate;

/// A record type that maps to one table row.
pub trait TableRow: Sized {
    /// Header written by [`to_table`].
    const COLUMNS: &'static [&'static str];

    fn to_cells(&self) -> Vec<String>;

    fn from_row(row: &RowView<'_>) -> Result<Self>;
}

/// Named access to the cells of one row; `row` numbers start at 1.
pub struct RowView<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowView<'a> {
    pub fn row_number(&self) -> usize {
        self.index + 1
    }

    /// Raw cell, trimmed.
    pub fn get(&self, column: &str) -> Result<&'a str> {
        let idx = self
            .table
            .column_index(column)
            .ok_or_else(|| AnalyticsError::missing_column(column))?;
        Ok(self.table.rows()[self.index][idx].trim())
    }

    pub fn get_opt(&self, column: &str) -> Option<&'a str> {
        self.get(column).ok()
    }

    pub fn f64(&self, column: &str) -> Result<f64> {
        parse_f64(self.get(column)?, self.row_number(), column)
    }

    /// Empty cell reads as `None`.
    pub fn opt_f64(&self, column: &str) -> Result<Option<f64>> {
        match self.get(column)? {
            "" => Ok(None),
            raw => parse_f64(raw, self.row_number(), column).map(Some),
        }
    }

    pub fn bool(&self, column: &str) -> Result<bool> {
        parse_bool(self.get(column)?, self.row_number(), column)
    }

    pub fn date(&self) -> Result<NaiveDate> {
        parse_date(self.get("date")?, self.row_number())
    }

    pub fn u64(&self, column: &str) -> Result<u64> {
        let raw = self.get(column)?;
        raw.parse().map_err(|e| AnalyticsError::Parse {
            row: self.row_number(),
            column: column.to_string(),
            detail: format!("'{}': {}", raw, e),
        })
    }
}

/// Table holding `records` under `T::COLUMNS`.
pub fn to_table<T: TableRow>(records: &[T]) -> Result<Table> {
    let mut table = Table::new(T::COLUMNS.iter().copied())?;
    for r in records {
        table.push_row(r.to_cells())?;
    }
    Ok(table)
}

/// Parse every row of `table`; extra columns are ignored.
pub fn from_table<T: TableRow>(table: &Table) -> Result<Vec<T>> {
    (0..table.len())
        .map(|index| T::from_row(&RowView { table, index }))
        .collect()
}

fn date_cell(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl TableRow for SalesRecord {
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "sales",
        "weekday",
        "month",
        "year",
        "is_weekend",
        "is_holiday",
        "is_promotion",
        "day_of_year",
    ];

    fn to_cells(&self) -> Vec<String> {
        vec![
            date_cell(self.date),
            self.sales.to_string(),
            self.weekday.to_string(),
            self.month.to_string(),
            self.year.to_string(),
            self.is_weekend.to_string(),
            self.is_holiday.to_string(),
            self.is_promotion.to_string(),
            self.day_of_year.to_string(),
        ]
    }

    /// Calendar columns are recomputed from `date`; flags default to false.
    fn from_row(row: &RowView<'_>) -> Result<Self> {
        let flag = |column: &str| match row.get_opt(column) {
            Some(raw) => parse_bool(raw, row.row_number(), column),
            None => Ok(false),
        };
        Ok(SalesRecord::new(
            row.date()?,
            row.f64("sales")?,
            flag("is_holiday")?,
            flag("is_promotion")?,
        ))
    }
}

impl TableRow for CustomerRecord {
    const COLUMNS: &'static [&'static str] = &[
        "customer_id",
        "avg_purchase_value",
        "purchase_frequency",
        "return_rate",
        "loyalty_years",
        "avg_basket_size",
        "pct_discount_used",
        "customer_value",
    ];

    fn to_cells(&self) -> Vec<String> {
        vec![
            self.customer_id.clone(),
            self.avg_purchase_value.to_string(),
            self.purchase_frequency.to_string(),
            self.return_rate.to_string(),
            self.loyalty_years.to_string(),
            self.avg_basket_size.to_string(),
            self.pct_discount_used.to_string(),
            self.customer_value.to_string(),
        ]
    }

    fn from_row(row: &RowView<'_>) -> Result<Self> {
        Ok(CustomerRecord {
            customer_id: row.get("customer_id")?.to_string(),
            avg_purchase_value: row.f64("avg_purchase_value")?,
            purchase_frequency: row.f64("purchase_frequency")?,
            return_rate: row.f64("return_rate")?,
            loyalty_years: row.f64("loyalty_years")?,
            avg_basket_size: row.f64("avg_basket_size")?,
            pct_discount_used: row.f64("pct_discount_used")?,
            customer_value: row.f64("customer_value")?,
        })
    }
}

impl TableRow for ForecastPoint {
    const COLUMNS: &'static [&'static str] = &["date", "predicted_sales", "lower", "upper"];

    fn to_cells(&self) -> Vec<String> {
        let bound = |b: Option<f64>| b.map(|v| v.to_string()).unwrap_or_default();
        vec![
            date_cell(self.date),
            self.predicted_sales.to_string(),
            bound(self.lower),
            bound(self.upper),
        ]
    }

    fn from_row(row: &RowView<'_>) -> Result<Self> {
        let bound = |column: &str| match row.get_opt(column) {
            Some(_) => row.opt_f64(column),
            None => Ok(None),
        };
        Ok(ForecastPoint {
            date: row.date()?,
            predicted_sales: row.f64("predicted_sales")?,
            lower: bound("lower")?,
            upper: bound("upper")?,
        })
    }
}

/// Forecast as a `date, predicted_sales, lower, upper` table.
pub fn forecast_to_table(forecast: &Forecast) -> Result<Table> {
    let points: Vec<ForecastPoint> = forecast.points().collect();
    to_table(&points)
}

/// Rebuild a forecast; intervals are kept only when every row has both bounds.
pub fn forecast_from_table(table: &Table) -> Result<Forecast> {
    let points: Vec<ForecastPoint> = from_table(table)?;
    let dates = points.iter().map(|p| p.date).collect();
    let values = points.iter().map(|p| p.predicted_sales).collect();
    let bounds: Option<(Vec<f64>, Vec<f64>)> = points
        .iter()
        .map(|p| p.lower.zip(p.upper))
        .collect::<Option<Vec<_>>>()
        .map(|pairs| pairs.into_iter().unzip());

    match bounds {
        Some((lower, upper)) if !points.is_empty() => {
            Forecast::from_values_with_intervals(dates, values, lower, upper)
        }
        _ => Forecast::from_values(dates, values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{create_customer_data, create_sample_sales_data};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn sales_records_survive_a_table() {
        let records = create_sample_sales_data(20, 3).unwrap();
        let table = to_table(&records).unwrap();
        assert_eq!(table.len(), 20);
        assert_eq!(table.columns()[0], "date");
        assert_eq!(from_table::<SalesRecord>(&table).unwrap(), records);
    }

    #[test]
    fn sales_rows_need_only_date_and_sales() {
        let table = Table::with_rows(
            ["date", "sales"],
            vec![vec!["2024-03-02".into(), "14.5".into()]],
        )
        .unwrap();
        let records: Vec<SalesRecord> = from_table(&table).unwrap();
        assert_eq!(records[0], SalesRecord::new(day(2), 14.5, false, false));

        let no_sales = Table::new(["date"]).unwrap();
        assert!(from_table::<SalesRecord>(&no_sales).unwrap().is_empty());
        let mut bad = Table::new(["date"]).unwrap();
        bad.push_row(vec!["2024-03-02".into()]).unwrap();
        assert_eq!(
            from_table::<SalesRecord>(&bad),
            Err(AnalyticsError::missing_column("sales"))
        );
    }

    #[test]
    fn customer_records_survive_a_table() {
        let customers = create_customer_data(15, 8).unwrap().customers;
        let table = to_table(&customers).unwrap();
        assert_eq!(from_table::<CustomerRecord>(&table).unwrap(), customers);
    }

    #[test]
    fn bad_cell_reports_row_and_column() {
        let table = Table::with_rows(
            ["date", "sales"],
            vec![
                vec!["2024-03-01".into(), "1".into()],
                vec!["2024-03-02".into(), "lots".into()],
            ],
        )
        .unwrap();
        match from_table::<SalesRecord>(&table) {
            Err(AnalyticsError::Parse { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "sales");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn forecast_keeps_intervals_when_complete() {
        let forecast = Forecast::from_values_with_intervals(
            vec![day(1), day(2)],
            vec![10.0, 11.0],
            vec![8.0, 8.5],
            vec![12.0, 13.5],
        )
        .unwrap();
        let table = forecast_to_table(&forecast).unwrap();
        assert_eq!(table.column("lower").unwrap(), vec!["8", "8.5"]);
        assert_eq!(forecast_from_table(&table).unwrap(), forecast);
    }

    #[test]
    fn forecast_without_intervals_has_blank_bounds() {
        let forecast = Forecast::from_values(vec![day(5)], vec![3.25]).unwrap();
        let table = forecast_to_table(&forecast).unwrap();
        assert_eq!(table.column("upper").unwrap(), vec![""]);

        let back = forecast_from_table(&table).unwrap();
        assert!(!back.has_intervals());
        assert_eq!(back.values(), &[3.25]);
    }
}

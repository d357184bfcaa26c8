//! Load dimension tables from CSV files

use super::{Geography, Product};
use crate::calendar::CalendarUnit;
use crate::error::EngineResult;
use chrono::NaiveDate;
use csv::Reader;
use std::path::Path;

/// Raw CSV row matching the dim_state columns
#[derive(Debug, serde::Deserialize)]
struct GeographyRow {
    state_code: String,
    region_code: String,
    market_tier: String,
}

impl GeographyRow {
    fn to_record(self) -> Geography {
        Geography {
            state_code: self.state_code,
            region_code: self.region_code,
            market_tier: self.market_tier,
        }
    }
}

/// Raw CSV row matching the dim_products columns
#[derive(Debug, serde::Deserialize)]
struct ProductRow {
    product_key: String,
    line_of_business: String,
    plan_name: String,
}

impl ProductRow {
    fn to_record(self) -> Product {
        Product {
            product_key: self.product_key,
            line_of_business: self.line_of_business,
            plan_name: self.plan_name,
        }
    }
}

/// Raw CSV row matching the dim_time columns
///
/// Only the date is read; derived attributes are recomputed so a unit loaded
/// from file and a unit built from a date range are byte-for-byte identical.
#[derive(Debug, serde::Deserialize)]
struct CalendarRow {
    full_date: NaiveDate,
}

/// Load the geography dimension from a CSV file
pub fn load_geography<P: AsRef<Path>>(path: P) -> EngineResult<Vec<Geography>> {
    load_geography_from_reader(std::fs::File::open(path)?)
}

/// Load the geography dimension from any reader
pub fn load_geography_from_reader<R: std::io::Read>(reader: R) -> EngineResult<Vec<Geography>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        let row: GeographyRow = result?;
        rows.push(row.to_record());
    }
    Ok(rows)
}

/// Load the product dimension from a CSV file
pub fn load_products<P: AsRef<Path>>(path: P) -> EngineResult<Vec<Product>> {
    load_products_from_reader(std::fs::File::open(path)?)
}

/// Load the product dimension from any reader
pub fn load_products_from_reader<R: std::io::Read>(reader: R) -> EngineResult<Vec<Product>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        let row: ProductRow = result?;
        rows.push(row.to_record());
    }
    Ok(rows)
}

/// Load calendar units from an upstream dim_time CSV file
pub fn load_calendar<P: AsRef<Path>>(path: P) -> EngineResult<Vec<CalendarUnit>> {
    load_calendar_from_reader(std::fs::File::open(path)?)
}

/// Load calendar units from any reader
pub fn load_calendar_from_reader<R: std::io::Read>(reader: R) -> EngineResult<Vec<CalendarUnit>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        let row: CalendarRow = result?;
        rows.push(CalendarUnit::from_date(row.full_date));
    }
    Ok(rows)
}

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Date32Type, Float32Type, Float64Type, Int32Type, Int64Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::clean::{clean, CleanOptions};
use super::error::{DataError, DataResult};
use super::model::{Column, Condition, Listing, ListingTable, RawValue};

/// Day/month/year, as the marketplace exports both date columns.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load, filter outliers and derive `Car_Age` in one go.
pub fn load_and_clean(path: &Path, options: &CleanOptions) -> DataResult<ListingTable> {
    log::info!("Loading listings from: {}", path.display());
    let raw = load_file(path)?;
    log::info!("Read {} listings with columns {:?}", raw.len(), raw.columns());
    let cleaned = clean(&raw, options);
    log::info!(
        "Kept {} of {} listings after the {:.0}th percentile filter",
        cleaned.len(),
        raw.len(),
        options.quantile * 100.0
    );
    Ok(cleaned)
}

/// Load listings from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the marketplace column names (primary)
/// * `.json`    – `[{ "Price": 12500, "Vehicle_brand": "Audi", ... }, ...]`
/// * `.parquet` – one column per field, dates as text or `Date32`
pub fn load_file(path: &Path) -> DataResult<ListingTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).map_err(|e| DataError::data_source(path, e))?;
            load_csv_reader(file, path)
        }
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataError::data_source(
            path,
            format!("unsupported file extension: .{other}"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Header → typed schema
// ---------------------------------------------------------------------------

/// Positions of the known columns inside a source row.
struct HeaderIndex {
    positions: Vec<(Column, usize)>,
}

impl HeaderIndex {
    /// Map source headers onto [`Column`]s, rejecting sources that miss a required one.
    fn from_headers<S: AsRef<str>>(headers: &[S], path: &Path) -> DataResult<Self> {
        let positions: Vec<(Column, usize)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| Column::from_name(h.as_ref()).map(|c| (c, i)))
            .collect();

        let missing: Vec<&str> = Column::REQUIRED
            .iter()
            .filter(|req| !positions.iter().any(|(c, _)| c == *req))
            .map(|c| c.name())
            .collect();
        if !missing.is_empty() {
            return Err(DataError::data_source(
                path,
                format!("missing required column(s): {}", missing.join(", ")),
            ));
        }

        Ok(HeaderIndex { positions })
    }

    fn columns(&self) -> Vec<Column> {
        self.positions.iter().map(|(c, _)| *c).collect()
    }

    /// Build one listing, pulling each known cell through `cell`.
    fn listing<F>(&self, cell: F) -> Listing
    where
        F: Fn(Column, usize) -> RawValue,
    {
        let mut listing = Listing::default();
        for &(column, idx) in &self.positions {
            let value = cell(column, idx);
            match column {
                Column::Price => listing.price = value.as_f64(),
                Column::Condition => {
                    listing.condition = value.as_text().as_deref().and_then(Condition::parse)
                }
                Column::VehicleBrand => listing.brand = value.as_text().unwrap_or_default(),
                Column::VehicleModel => listing.model = value.as_text().unwrap_or_default(),
                Column::ProductionYear => listing.production_year = value.as_i32(),
                Column::MileageKm => listing.mileage_km = value.as_f64(),
                Column::PowerHp => listing.power_hp = value.as_f64(),
                Column::DisplacementCm3 => listing.displacement_cm3 = value.as_f64(),
                Column::FuelType => listing.fuel_type = value.as_text(),
                Column::Transmission => listing.transmission = value.as_text(),
                Column::Colour => listing.colour = value.as_text(),
                Column::OriginCountry => listing.origin_country = value.as_text(),
                Column::Co2Emissions => listing.co2_emissions = value.as_f64(),
                Column::DoorsNumber => listing.doors_number = value.as_f64(),
                Column::OfferPublicationDate => {
                    listing.offer_publication_date = value.as_date(DATE_FORMAT)
                }
                Column::FirstRegistrationDate => {
                    listing.first_registration_date = value.as_date(DATE_FORMAT)
                }
                Column::CarAge => {}
            }
        }
        listing
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the marketplace column names, one listing per row.
/// `path` is only used for error messages.
pub fn load_csv_reader<R: Read>(reader: R, path: &Path) -> DataResult<ListingTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DataError::data_source(path, format!("reading CSV headers: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let index = HeaderIndex::from_headers(&headers, path)?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| DataError::data_source(path, format!("CSV row {row_no}: {e}")))?;
        rows.push(index.listing(|column, i| csv_cell(column, record.get(i).unwrap_or(""))));
    }

    Ok(ListingTable::new(index.columns(), rows))
}

/// Only numeric columns are type-guessed; text columns keep the cell as written
/// so that `0595` and `595` stay distinct models.
fn csv_cell(column: Column, s: &str) -> RawValue {
    if column.is_numeric() {
        guess_raw_value(s)
    } else if s.trim().is_empty() {
        RawValue::Null
    } else {
        RawValue::String(s.to_string())
    }
}

fn guess_raw_value(s: &str) -> RawValue {
    let s = s.trim();
    if s.is_empty() {
        return RawValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return RawValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return RawValue::Float(f);
    }
    RawValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Price": 12500, "Vehicle_brand": "Audi", "Offer_publication_date": "04/05/2021", ... },
///   ...
/// ]
/// ```
///
/// The column set is the union of keys over all records; a missing key is null.
fn load_json(path: &Path) -> DataResult<ListingTable> {
    let text = std::fs::read_to_string(path).map_err(|e| DataError::data_source(path, e))?;
    parse_json_records(&text, path)
}

fn parse_json_records(text: &str, path: &Path) -> DataResult<ListingTable> {
    let root: JsonValue = serde_json::from_str(text)
        .map_err(|e| DataError::data_source(path, format!("parsing JSON: {e}")))?;
    let records = root
        .as_array()
        .ok_or_else(|| DataError::data_source(path, "expected top-level JSON array"))?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| DataError::data_source(path, format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    let index = HeaderIndex::from_headers(&headers, path)?;

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            index.listing(|_, i| {
                obj.get(&headers[i])
                    .map(json_to_raw)
                    .unwrap_or(RawValue::Null)
            })
        })
        .collect();

    Ok(ListingTable::new(index.columns(), rows))
}

fn json_to_raw(val: &JsonValue) -> RawValue {
    match val {
        JsonValue::String(s) => RawValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                RawValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                RawValue::Float(f)
            } else {
                RawValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => RawValue::Bool(*b),
        JsonValue::Null => RawValue::Null,
        other => RawValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per listing field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). Dates may be stored as `dd/mm/yyyy`
/// strings or as native `Date32`.
fn load_parquet(path: &Path) -> DataResult<ListingTable> {
    let file = std::fs::File::open(path).map_err(|e| DataError::data_source(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| DataError::data_source(path, format!("reading parquet metadata: {e}")))?;

    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let index = HeaderIndex::from_headers(&headers, path)?;

    let reader = builder
        .build()
        .map_err(|e| DataError::data_source(path, format!("building parquet reader: {e}")))?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result
            .map_err(|e| DataError::data_source(path, format!("reading record batch: {e}")))?;
        for row in 0..batch.num_rows() {
            rows.push(index.listing(|_, i| extract_raw_value(batch.column(i), row)));
        }
    }

    Ok(ListingTable::new(index.columns(), rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_raw_value(col: &Arc<dyn Array>, row: usize) -> RawValue {
    if col.is_null(row) {
        return RawValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => RawValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => RawValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => RawValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => RawValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => RawValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => RawValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => RawValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map(RawValue::Date)
            .unwrap_or(RawValue::Null),
        _ => RawValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str = "Index,Price,Condition,Vehicle_brand,Vehicle_model,Production_year,\
Mileage_km,Fuel_type,Colour,Offer_publication_date,First_registration_date";

    fn csv(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for r in rows {
            text.push('\n');
            text.push_str(r);
        }
        text
    }

    fn load(text: &str) -> DataResult<ListingTable> {
        load_csv_reader(text.as_bytes(), Path::new("memory.csv"))
    }

    #[test]
    fn test_csv_typed_fields() {
        let table = load(&csv(&[
            "0,86200,New,Abarth,595,2021,1,Gasoline,gray,04/05/2021,",
            "1,43500,Used,Abarth,Other,1974,59000,Gasoline,silver,03/05/2021,01/12/1980",
        ]))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert!(!table.has_column(Column::PowerHp));
        let first = &table.rows()[0];
        assert_eq!(first.price, Some(86200.0));
        assert_eq!(first.condition, Some(Condition::New));
        assert_eq!(first.brand, "Abarth");
        assert_eq!(first.model, "595");
        assert_eq!(first.production_year, Some(2021));
        assert_eq!(first.colour.as_deref(), Some("gray"));
        assert_eq!(first.offer_publication_date, NaiveDate::from_ymd_opt(2021, 5, 4));
        assert_eq!(first.first_registration_date, None);
        assert_eq!(
            table.rows()[1].first_registration_date,
            NaiveDate::from_ymd_opt(1980, 12, 1)
        );
    }

    #[test]
    fn test_text_columns_keep_numeric_looking_values() {
        let table = load(&csv(&[
            "0,30000,Used,Fiat,0595,2015,80000,Gasoline,1e3,01/05/2021,",
            "1,31000,Used,Fiat,595,2015,80000,Gasoline,gray,01/05/2021,",
            "2,42000,Used,BMW,2.0,2016,90000,Diesel,black,01/05/2021,",
        ]))
        .unwrap();

        let models: Vec<&str> = table.rows().iter().map(|r| r.model.as_str()).collect();
        assert_eq!(models, vec!["0595", "595", "2.0"]);
        assert_eq!(table.rows()[0].colour.as_deref(), Some("1e3"));
        assert_eq!(table.rows()[0].production_year, Some(2015));
        assert_eq!(table.rows()[2].price, Some(42000.0));
    }

    #[test]
    fn test_unparseable_date_loads_as_null() {
        let table = load(&csv(&[
            "0,10000,Used,Audi,A4,2010,150000,Diesel,black,not-a-date,05/06/2010",
        ]))
        .unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].offer_publication_date, None);
        assert_eq!(
            table.rows()[0].first_registration_date,
            NaiveDate::from_ymd_opt(2010, 6, 5)
        );
    }

    #[test]
    fn test_bad_values_become_null() {
        let table = load(&csv(&["0,call me,Broken,Audi,A4,,lots,,,,"])).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.price, None);
        assert_eq!(row.condition, None);
        assert_eq!(row.production_year, None);
        assert_eq!(row.mileage_km, None);
        assert_eq!(row.fuel_type, None);
    }

    #[test]
    fn test_load_and_clean_from_csv_file() {
        // Prices 1_000..=20_000; only the 20_000 row sits above the 95th percentile
        // (19_050). Year and mileage are constant so they trim nothing.
        let rows: Vec<String> = (1..=20)
            .map(|i| {
                let offer = if i == 3 { "not-a-date" } else { "04/05/2021" };
                format!("{i},{},Used,Opel,Astra,2015,100000,Diesel,black,{offer},", i * 1_000)
            })
            .collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();

        let path = std::env::temp_dir().join(format!(
            "car-market-dashboard-clean-{}.csv",
            std::process::id()
        ));
        std::fs::write(&path, csv(&rows)).unwrap();
        let table = load_and_clean(&path, &CleanOptions::default());
        std::fs::remove_file(&path).ok();
        let table = table.unwrap();

        assert_eq!(table.len(), 19);
        assert!(table.rows().iter().all(|r| r.price < Some(20_000.0)));

        assert!(table.has_column(Column::CarAge));
        assert!(table.rows().iter().all(|r| r.car_age == Some(10)));

        let bad_date = &table.rows()[2];
        assert_eq!(bad_date.price, Some(3_000.0));
        assert_eq!(bad_date.offer_publication_date, None);
        assert_eq!(
            table.rows()[0].offer_publication_date,
            NaiveDate::from_ymd_opt(2021, 5, 4)
        );
    }

    #[test]
    fn test_missing_required_column_is_data_source_error() {
        let err = load("Price,Vehicle_brand\n100,Audi").unwrap_err();
        match err {
            DataError::DataSource { reason, .. } => {
                assert!(reason.contains("Condition"));
                assert!(reason.contains("Offer_publication_date"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_row_is_data_source_error() {
        let err = load(&csv(&["0,100,Used"])).unwrap_err();
        assert!(matches!(err, DataError::DataSource { .. }));
    }

    #[test]
    fn test_missing_file_and_unknown_extension() {
        let missing = load_file(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(missing, DataError::DataSource { .. }));
        let unsupported = load_file(Path::new("listings.xlsx")).unwrap_err();
        assert!(unsupported.to_string().contains(".xlsx"));
    }

    #[test]
    fn test_json_records() {
        let text = r#"[
            {"Price": 12500, "Condition": "Used", "Vehicle_brand": "Opel", "Vehicle_model": "Astra",
             "Production_year": 2012.0, "Offer_publication_date": "01/02/2021",
             "First_registration_date": null},
            {"Price": "n/a", "Condition": "New", "Vehicle_brand": "Kia", "Vehicle_model": "Ceed",
             "Production_year": 2021, "Offer_publication_date": "x",
             "First_registration_date": "02/02/2021", "Colour": "red"}
        ]"#;
        let table = parse_json_records(text, Path::new("memory.json")).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_column(Column::Colour));
        assert_eq!(table.rows()[0].production_year, Some(2012));
        assert_eq!(table.rows()[0].colour, None);
        assert_eq!(table.rows()[1].price, None);
        assert_eq!(table.rows()[1].offer_publication_date, None);
    }

    #[test]
    fn test_json_not_an_array() {
        let err = parse_json_records("{}", Path::new("memory.json")).unwrap_err();
        assert!(matches!(err, DataError::DataSource { .. }));
    }

    #[test]
    fn test_parquet_round_trip_through_arrow() {
        use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
        use arrow::datatypes::{Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            Field::new("Price", DataType::Float64, true),
            Field::new("Condition", DataType::Utf8, true),
            Field::new("Vehicle_brand", DataType::Utf8, true),
            Field::new("Vehicle_model", DataType::Utf8, true),
            Field::new("Production_year", DataType::Int64, true),
            Field::new("Offer_publication_date", DataType::Date32, true),
            Field::new("First_registration_date", DataType::Utf8, true),
        ]));
        // 18_751 days after the epoch is 2021-05-04.
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![Some(9900.0), None])),
                Arc::new(StringArray::from(vec!["Used", "New"])),
                Arc::new(StringArray::from(vec!["Skoda", "Fiat"])),
                Arc::new(StringArray::from(vec!["Fabia", "500"])),
                Arc::new(Int64Array::from(vec![Some(2015), None])),
                Arc::new(Date32Array::from(vec![Some(18_751), None])),
                Arc::new(StringArray::from(vec![Some("03/04/2015"), Some("bad")])),
            ],
        )
        .unwrap();

        let path = std::env::temp_dir().join(format!(
            "car-market-dashboard-{}.parquet",
            std::process::id()
        ));
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(first.price, Some(9900.0));
        assert_eq!(first.brand, "Skoda");
        assert_eq!(first.production_year, Some(2015));
        assert_eq!(first.offer_publication_date, NaiveDate::from_ymd_opt(2021, 5, 4));
        assert_eq!(first.first_registration_date, NaiveDate::from_ymd_opt(2015, 4, 3));
        let second = &table.rows()[1];
        assert_eq!(second.price, None);
        assert_eq!(second.production_year, None);
        assert_eq!(second.first_registration_date, None);
    }
}

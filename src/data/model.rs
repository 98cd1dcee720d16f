use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::error::{DataError, DataResult};

// ---------------------------------------------------------------------------
// RawValue – a single cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, before it is coerced into a [`Listing`] field.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Null,
}

impl RawValue {
    /// Numeric view of the cell. Text is parsed; anything unparseable is null.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Float(v) if v.is_finite() => Some(*v),
            RawValue::Integer(i) => Some(*i as f64),
            RawValue::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Whole-number view of the cell (`2015` and `2015.0` both qualify).
    pub fn as_i32(&self) -> Option<i32> {
        let v = self.as_f64()?;
        if v.fract() != 0.0 || v < i32::MIN as f64 || v > i32::MAX as f64 {
            return None;
        }
        Some(v as i32)
    }

    /// Category view: trimmed, non-empty text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            RawValue::Integer(i) => Some(i.to_string()),
            RawValue::Float(v) => Some(v.to_string()),
            RawValue::Bool(b) => Some(b.to_string()),
            RawValue::Date(d) => Some(d.to_string()),
            RawValue::Null => None,
        }
    }

    /// Date view. Text must match `format` exactly, otherwise the cell is null.
    pub fn as_date(&self, format: &str) -> Option<NaiveDate> {
        match self {
            RawValue::Date(d) => Some(*d),
            RawValue::String(s) => NaiveDate::parse_from_str(s.trim(), format).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::String(s) => write!(f, "{s}"),
            RawValue::Integer(i) => write!(f, "{i}"),
            RawValue::Float(v) => write!(f, "{v}"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Date(d) => write!(f, "{d}"),
            RawValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column – the typed schema shared by the loader and every helper
// ---------------------------------------------------------------------------

/// Every column the dashboard knows about, named after its source header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Price,
    Condition,
    VehicleBrand,
    VehicleModel,
    ProductionYear,
    MileageKm,
    PowerHp,
    DisplacementCm3,
    FuelType,
    Transmission,
    Colour,
    OriginCountry,
    Co2Emissions,
    DoorsNumber,
    OfferPublicationDate,
    FirstRegistrationDate,
    /// Derived after outlier filtering; never read from the source.
    CarAge,
}

impl Column {
    /// Columns that may appear in a source file, in canonical order.
    pub const SOURCE: [Column; 16] = [
        Column::Price,
        Column::Condition,
        Column::VehicleBrand,
        Column::VehicleModel,
        Column::ProductionYear,
        Column::MileageKm,
        Column::PowerHp,
        Column::DisplacementCm3,
        Column::FuelType,
        Column::Transmission,
        Column::Colour,
        Column::OriginCountry,
        Column::Co2Emissions,
        Column::DoorsNumber,
        Column::OfferPublicationDate,
        Column::FirstRegistrationDate,
    ];

    /// A source without any of these is structurally invalid.
    pub const REQUIRED: [Column; 7] = [
        Column::Price,
        Column::Condition,
        Column::VehicleBrand,
        Column::VehicleModel,
        Column::ProductionYear,
        Column::OfferPublicationDate,
        Column::FirstRegistrationDate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Price => "Price",
            Column::Condition => "Condition",
            Column::VehicleBrand => "Vehicle_brand",
            Column::VehicleModel => "Vehicle_model",
            Column::ProductionYear => "Production_year",
            Column::MileageKm => "Mileage_km",
            Column::PowerHp => "Power_HP",
            Column::DisplacementCm3 => "Displacement_cm3",
            Column::FuelType => "Fuel_type",
            Column::Transmission => "Transmission",
            Column::Colour => "Colour",
            Column::OriginCountry => "Origin_country",
            Column::Co2Emissions => "CO2_emissions",
            Column::DoorsNumber => "Doors_number",
            Column::OfferPublicationDate => "Offer_publication_date",
            Column::FirstRegistrationDate => "First_registration_date",
            Column::CarAge => "Car_Age",
        }
    }

    /// Look up a source header. Unknown headers map to `None`.
    pub fn from_name(name: &str) -> Option<Column> {
        let name = name.trim();
        Column::SOURCE.into_iter().find(|c| c.name() == name)
    }

    pub fn is_categorical(self) -> bool {
        matches!(
            self,
            Column::Condition
                | Column::VehicleBrand
                | Column::VehicleModel
                | Column::FuelType
                | Column::Transmission
                | Column::Colour
                | Column::OriginCountry
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Column::Price
                | Column::ProductionYear
                | Column::MileageKm
                | Column::PowerHp
                | Column::DisplacementCm3
                | Column::Co2Emissions
                | Column::DoorsNumber
                | Column::CarAge
        )
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Condition {
    New,
    Used,
}

impl Condition {
    pub const ALL: [Condition; 2] = [Condition::New, Condition::Used];

    /// Parse the marketplace label. Anything else is treated as unknown.
    pub fn parse(s: &str) -> Option<Condition> {
        match s.trim() {
            "New" => Some(Condition::New),
            "Used" => Some(Condition::Used),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Condition::New => "New",
            Condition::Used => "Used",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Listing – one row of the dataset
// ---------------------------------------------------------------------------

/// A single car offer. Serializes with the source header names.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Listing {
    #[serde(rename = "Vehicle_brand")]
    pub brand: String,
    #[serde(rename = "Vehicle_model")]
    pub model: String,
    #[serde(rename = "Production_year")]
    pub production_year: Option<i32>,
    #[serde(rename = "Price")]
    pub price: Option<f64>,
    #[serde(rename = "Mileage_km")]
    pub mileage_km: Option<f64>,
    #[serde(rename = "Condition")]
    pub condition: Option<Condition>,
    #[serde(rename = "Fuel_type")]
    pub fuel_type: Option<String>,
    #[serde(rename = "Transmission")]
    pub transmission: Option<String>,
    #[serde(rename = "Colour")]
    pub colour: Option<String>,
    #[serde(rename = "Origin_country")]
    pub origin_country: Option<String>,
    #[serde(rename = "Power_HP")]
    pub power_hp: Option<f64>,
    #[serde(rename = "Displacement_cm3")]
    pub displacement_cm3: Option<f64>,
    #[serde(rename = "CO2_emissions")]
    pub co2_emissions: Option<f64>,
    #[serde(rename = "Doors_number")]
    pub doors_number: Option<f64>,
    #[serde(rename = "Offer_publication_date")]
    pub offer_publication_date: Option<NaiveDate>,
    #[serde(rename = "First_registration_date")]
    pub first_registration_date: Option<NaiveDate>,
    #[serde(rename = "Car_Age")]
    pub car_age: Option<i32>,
}

impl Listing {
    /// Value of a numeric column, `None` for nulls and non-numeric columns.
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::Price => self.price,
            Column::ProductionYear => self.production_year.map(f64::from),
            Column::MileageKm => self.mileage_km,
            Column::PowerHp => self.power_hp,
            Column::DisplacementCm3 => self.displacement_cm3,
            Column::Co2Emissions => self.co2_emissions,
            Column::DoorsNumber => self.doors_number,
            Column::CarAge => self.car_age.map(f64::from),
            _ => None,
        }
    }

    /// Value of a categorical column, `None` for nulls and non-categorical columns.
    pub fn category(&self, column: Column) -> Option<&str> {
        match column {
            Column::VehicleBrand => Some(self.brand.as_str()).filter(|s| !s.is_empty()),
            Column::VehicleModel => Some(self.model.as_str()).filter(|s| !s.is_empty()),
            Column::Condition => self.condition.map(Condition::as_str),
            Column::FuelType => self.fuel_type.as_deref(),
            Column::Transmission => self.transmission.as_deref(),
            Column::Colour => self.colour.as_deref(),
            Column::OriginCountry => self.origin_country.as_deref(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ListingTable – the in-memory dataset
// ---------------------------------------------------------------------------

/// Listings together with the set of columns the source actually carried.
///
/// Tables are never mutated after construction; every transformation builds
/// a new one that keeps the column set (and adds to it, for derived columns).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingTable {
    columns: Vec<Column>,
    rows: Vec<Listing>,
}

impl ListingTable {
    pub fn new(columns: impl IntoIterator<Item = Column>, rows: Vec<Listing>) -> Self {
        let mut present: Vec<Column> = Vec::new();
        for col in columns {
            if !present.contains(&col) {
                present.push(col);
            }
        }
        ListingTable {
            columns: present,
            rows,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Listing] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    /// Fail with [`DataError::Schema`] when `column` is absent.
    pub fn require(&self, column: Column) -> DataResult<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(DataError::Schema { column })
        }
    }

    /// Numeric columns present in the table, in table order.
    pub fn numeric_columns(&self) -> Vec<Column> {
        self.columns
            .iter()
            .copied()
            .filter(|c| c.is_numeric())
            .collect()
    }

    /// Non-null values of a numeric column, in row order.
    pub fn numeric_values(&self, column: Column) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r.numeric(column)).collect()
    }

    /// New table with the same columns and only the rows matching `keep`.
    pub fn filter_rows<F>(&self, keep: F) -> ListingTable
    where
        F: Fn(&Listing) -> bool,
    {
        ListingTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Same columns, different rows.
    pub fn with_rows(&self, rows: Vec<Listing>) -> ListingTable {
        ListingTable {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Consume the table, mark `column` as present and rewrite every row.
    pub fn with_derived_column<F>(mut self, column: Column, mut derive: F) -> ListingTable
    where
        F: FnMut(&mut Listing),
    {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
        self.rows.iter_mut().for_each(|r| derive(r));
        self
    }
}

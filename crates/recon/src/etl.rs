//! Import classification: header signature → typed, validated rows.
//!
//! A row set is classified as exactly one feed (or `Unknown`); rows that fail
//! required-field checks are dropped and counted by reason, never silently.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::model::{CandidateProduct, CatalogPrice, InternalProduct, PriceSignal};
use crate::normalize::sku_key;
use crate::size::extract_size;
use crate::table::{CellValue, RawRow};

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

const MONITORING_COLUMNS: &[&str] = &["myprice", "myposition", "productcode", "minimumprice"];
const MONITORING_MIN: usize = 3;

const SALES_COLUMNS: &[&str] = &[
    "sku",
    "weekenddate",
    "unitssold",
    "netrevenue",
    "regularprice",
    "promoflag",
];
const SALES_MIN: usize = 3;

// Product feed: logical field -> accepted header spellings (normalized).
const P_SKU: &[&str] = &["sku", "indeks", "kod"];
const P_EAN: &[&str] = &["ean", "barcode", "kodkreskowy"];
const P_NAME: &[&str] = &["productname", "name", "nazwa", "nazwaproduktu"];
const P_BRAND: &[&str] = &["brand", "marka"];
const P_CATEGORY: &[&str] = &["category", "kategoria"];
const P_SUBCATEGORY: &[&str] = &["subcategory", "podkategoria"];
const P_COST: &[&str] = &["costprice", "cost", "cenazakupu"];
const P_PRICE: &[&str] = &["currentprice", "price", "cena"];
const P_VAT: &[&str] = &["vatrate", "vat"];
const P_PRIVATE_LABEL: &[&str] = &["privatelabel"];
const P_STATUS: &[&str] = &["status"];
const P_SIZE: &[&str] = &["size", "pojemnosc", "gramatura"];

const PRODUCT_EXTRAS: &[&[&str]] = &[
    P_BRAND,
    P_CATEGORY,
    P_SUBCATEGORY,
    P_COST,
    P_PRICE,
    P_VAT,
    P_PRIVATE_LABEL,
    P_STATUS,
];

/// Header key used for signature matching: lowercase, no spaces,
/// underscores or hyphens.
fn header_key(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalized header key -> original header.
struct HeaderIndex {
    by_key: HashMap<String, String>,
}

impl HeaderIndex {
    fn new(headers: &[String]) -> Self {
        let mut by_key = HashMap::new();
        for h in headers {
            by_key.entry(header_key(h)).or_insert_with(|| h.clone());
        }
        Self { by_key }
    }

    fn has(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// First header matching any accepted spelling.
    fn find(&self, spellings: &[&str]) -> Option<&str> {
        spellings
            .iter()
            .find_map(|s| self.by_key.get(*s).map(String::as_str))
    }

    fn count(&self, keys: &[&str]) -> usize {
        keys.iter().filter(|k| self.has(k)).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Product,
    Sales,
    Monitoring,
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Product => write!(f, "product"),
            Self::Sales => write!(f, "sales"),
            Self::Monitoring => write!(f, "monitoring"),
        }
    }
}

/// Classify a header set. Monitoring is checked first (most distinctive),
/// then sales, then product.
pub fn detect_feed(headers: &[String]) -> Option<FeedKind> {
    let index = HeaderIndex::new(headers);

    if index.count(MONITORING_COLUMNS) >= MONITORING_MIN {
        return Some(FeedKind::Monitoring);
    }

    if index.has("sku") && index.has("unitssold") && index.count(SALES_COLUMNS) >= SALES_MIN {
        return Some(FeedKind::Sales);
    }

    let has_id = index.find(P_SKU).is_some() || index.find(P_EAN).is_some();
    let has_name = index.find(P_NAME).is_some();
    let extras = PRODUCT_EXTRAS
        .iter()
        .filter(|spellings| index.find(spellings).is_some())
        .count();
    if has_id && has_name && extras >= 1 {
        return Some(FeedKind::Product);
    }

    None
}

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyRow,
    MissingSku,
    MissingName,
    InvalidQuantity,
    InvalidPrice,
    InvalidDate,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRow => write!(f, "empty_row"),
            Self::MissingSku => write!(f, "missing_sku"),
            Self::MissingName => write!(f, "missing_name"),
            Self::InvalidQuantity => write!(f, "invalid_quantity"),
            Self::InvalidPrice => write!(f, "invalid_price"),
            Self::InvalidDate => write!(f, "invalid_date"),
        }
    }
}

/// Always satisfies `total_rows == valid_rows + skipped.values().sum()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub skipped: BTreeMap<SkipReason, usize>,
}

impl ImportSummary {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    fn record<T>(&mut self, outcome: Result<T, SkipReason>, out: &mut Vec<T>) {
        self.total_rows += 1;
        match outcome {
            Ok(row) => {
                self.valid_rows += 1;
                out.push(row);
            }
            Err(reason) => *self.skipped.entry(reason).or_insert(0) += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRow {
    pub sku: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_label: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ProductRow {
    /// Free-text size: the size column, else the name when it carries one.
    fn size_text(&self) -> Option<String> {
        self.size
            .clone()
            .or_else(|| extract_size(&self.name).map(|_| self.name.clone()))
    }

    pub fn to_internal_product(&self, id: impl Into<String>) -> InternalProduct {
        InternalProduct {
            id: id.into(),
            sku: self.sku.clone(),
            name: self.name.clone(),
            brand: self.brand.clone(),
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
            size: self.size_text(),
            barcode: self.ean.clone(),
        }
    }

    /// Catalog price state. A non-positive current price counts as unset.
    pub fn to_catalog_price(&self, product_id: impl Into<String>) -> CatalogPrice {
        CatalogPrice {
            product_id: product_id.into(),
            sku: self.sku.clone(),
            regular_price: self.current_price.filter(|p| *p > 0.0),
            cost_price: self.cost_price,
            active_promo: None,
        }
    }

    pub fn to_candidate(&self, source: &str) -> CandidateProduct {
        CandidateProduct {
            id: format!("{source}:{}", self.sku),
            name: self.name.clone(),
            brand: self.brand.clone(),
            category: self.category.clone(),
            size: self.size_text(),
            price: self.current_price,
            promo_price: None,
            source: Some(source.to_string()),
            url: None,
            external_sku: Some(self.sku.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRow {
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_end_date: Option<NaiveDate>,
    pub units_sold: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net_revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<f64>,
    pub promo_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringRow {
    pub product_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_price: Option<f64>,
    /// Remaining non-blank columns (competitor prices, names, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl MonitoringRow {
    /// The observed own-shelf price as a sync signal, if the row carries one.
    pub fn price_signal(&self, source: &str, date: NaiveDate) -> Option<PriceSignal> {
        self.my_price.map(|price| PriceSignal {
            sku: self.product_code.clone(),
            price,
            source: source.to_string(),
            date,
        })
    }
}

/// Discriminated import result. Never a mix of feeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EtlOutcome {
    Product {
        rows: Vec<ProductRow>,
        summary: ImportSummary,
    },
    Sales {
        rows: Vec<SalesRow>,
        summary: ImportSummary,
    },
    Monitoring {
        rows: Vec<MonitoringRow>,
        summary: ImportSummary,
    },
    Unknown {
        message: String,
        headers: Vec<String>,
    },
}

impl EtlOutcome {
    pub fn kind(&self) -> Option<FeedKind> {
        match self {
            Self::Product { .. } => Some(FeedKind::Product),
            Self::Sales { .. } => Some(FeedKind::Sales),
            Self::Monitoring { .. } => Some(FeedKind::Monitoring),
            Self::Unknown { .. } => None,
        }
    }

    pub fn summary(&self) -> Option<&ImportSummary> {
        match self {
            Self::Product { summary, .. }
            | Self::Sales { summary, .. }
            | Self::Monitoring { summary, .. } => Some(summary),
            Self::Unknown { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a decoded row set by its headers and validate every row.
pub fn classify_rows(headers: &[String], rows: &[RawRow]) -> EtlOutcome {
    let index = HeaderIndex::new(headers);
    let outcome = match detect_feed(headers) {
        Some(FeedKind::Monitoring) => {
            let (rows, summary) = validate(rows, |r| monitoring_row(&index, r));
            EtlOutcome::Monitoring { rows, summary }
        }
        Some(FeedKind::Sales) => {
            let (rows, summary) = validate(rows, |r| sales_row(&index, r));
            EtlOutcome::Sales { rows, summary }
        }
        Some(FeedKind::Product) => {
            let (rows, summary) = validate(rows, |r| product_row(&index, r));
            EtlOutcome::Product { rows, summary }
        }
        None => {
            let message = format!(
                "unrecognized column layout ({} columns). Expected a product feed \
                 (SKU/EAN, Product_Name and e.g. Brand, Category, Cost_Price, Current_Price), \
                 a sales feed (SKU, Week_End_Date, Units_Sold, ...) or a monitoring feed \
                 (at least {MONITORING_MIN} of My Price, My Position, Product Code, Minimum Price)",
                headers.len()
            );
            log::warn!("import rejected: {message}");
            return EtlOutcome::Unknown {
                message,
                headers: headers.to_vec(),
            };
        }
    };

    if let Some(summary) = outcome.summary() {
        log::info!(
            "{} import: {} of {} rows valid",
            outcome.kind().map(|k| k.to_string()).unwrap_or_default(),
            summary.valid_rows,
            summary.total_rows
        );
        for (reason, count) in &summary.skipped {
            log::warn!("skipped {count} rows: {reason}");
        }
    }
    outcome
}

fn validate<T>(
    rows: &[RawRow],
    parse: impl Fn(&RawRow) -> Result<T, SkipReason>,
) -> (Vec<T>, ImportSummary) {
    let mut summary = ImportSummary::default();
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let outcome = if row.values().all(CellValue::is_blank) {
            Err(SkipReason::EmptyRow)
        } else {
            parse(row)
        };
        summary.record(outcome, &mut out);
    }
    (out, summary)
}

fn cell<'a>(index: &HeaderIndex, row: &'a RawRow, spellings: &[&str]) -> Option<&'a CellValue> {
    index.find(spellings).and_then(|h| row.get(h))
}

fn text(index: &HeaderIndex, row: &RawRow, spellings: &[&str]) -> Option<String> {
    cell(index, row, spellings).and_then(CellValue::as_text)
}

/// Blank → `Ok(None)`, unparseable → `Err(reason)`.
fn number(
    index: &HeaderIndex,
    row: &RawRow,
    spellings: &[&str],
    reason: SkipReason,
) -> Result<Option<f64>, SkipReason> {
    match cell(index, row, spellings) {
        None => Ok(None),
        Some(c) if c.is_blank() => Ok(None),
        Some(c) => parse_number(c).map(Some).ok_or(reason),
    }
}

/// Optional column: an unparseable value is dropped with a warning, the row stays.
fn lenient_number(
    index: &HeaderIndex,
    row: &RawRow,
    spellings: &[&str],
    sku: &str,
) -> Option<f64> {
    let c = cell(index, row, spellings).filter(|c| !c.is_blank())?;
    let parsed = parse_number(c);
    if parsed.is_none() {
        log::warn!(
            "{sku}: ignoring unparseable {} value {:?}",
            index.find(spellings).unwrap_or_default(),
            c.as_text().unwrap_or_default()
        );
    }
    parsed
}

fn product_row(index: &HeaderIndex, row: &RawRow) -> Result<ProductRow, SkipReason> {
    let ean = text(index, row, P_EAN);
    let sku = text(index, row, P_SKU)
        .or_else(|| ean.clone())
        .ok_or(SkipReason::MissingSku)?;
    let name = text(index, row, P_NAME).ok_or(SkipReason::MissingName)?;
    let cost_price = lenient_number(index, row, P_COST, &sku);
    let current_price = lenient_number(index, row, P_PRICE, &sku);
    let vat_rate = lenient_number(index, row, P_VAT, &sku);

    Ok(ProductRow {
        sku,
        name,
        ean,
        brand: text(index, row, P_BRAND),
        category: text(index, row, P_CATEGORY),
        subcategory: text(index, row, P_SUBCATEGORY),
        size: text(index, row, P_SIZE),
        cost_price,
        current_price,
        vat_rate,
        private_label: cell(index, row, P_PRIVATE_LABEL).and_then(parse_bool),
        status: text(index, row, P_STATUS),
    })
}

fn sales_row(index: &HeaderIndex, row: &RawRow) -> Result<SalesRow, SkipReason> {
    let sku = text(index, row, &["sku"]).ok_or(SkipReason::MissingSku)?;
    let units_sold = number(index, row, &["unitssold"], SkipReason::InvalidQuantity)?
        .ok_or(SkipReason::InvalidQuantity)?;
    let week_end_date = match cell(index, row, &["weekenddate"]) {
        None => None,
        Some(c) if c.is_blank() => None,
        Some(c) => Some(parse_date(c).ok_or(SkipReason::InvalidDate)?),
    };
    let net_revenue = lenient_number(index, row, &["netrevenue"], &sku);
    let regular_price = lenient_number(index, row, &["regularprice"], &sku);

    Ok(SalesRow {
        sku,
        week_end_date,
        units_sold,
        net_revenue,
        regular_price,
        promo_flag: cell(index, row, &["promoflag"])
            .and_then(parse_bool)
            .unwrap_or(false),
    })
}

fn monitoring_row(index: &HeaderIndex, row: &RawRow) -> Result<MonitoringRow, SkipReason> {
    let product_code = text(index, row, &["productcode"]).ok_or(SkipReason::MissingSku)?;
    let my_price = number(index, row, &["myprice"], SkipReason::InvalidPrice)?;
    let minimum_price = number(index, row, &["minimumprice"], SkipReason::InvalidPrice)?;

    let known: HashSet<&str> = MONITORING_COLUMNS
        .iter()
        .filter_map(|k| index.find(&[*k]))
        .collect();
    let extra = row
        .iter()
        .filter(|(h, _)| !known.contains(h.as_str()))
        .filter_map(|(h, v)| v.as_text().map(|t| (h.clone(), t)))
        .collect();

    Ok(MonitoringRow {
        product_code,
        my_price,
        my_position: text(index, row, &["myposition"]),
        minimum_price,
        extra,
    })
}

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

const CURRENCY_MARKERS: &[&str] = &["zł", "pln", "eur", "usd", "€", "$"];

/// Lenient number parsing: decimal comma, thousands separators, currency
/// markers. A trailing `%` yields a fraction (`"23%"` → `0.23`).
pub fn parse_number(value: &CellValue) -> Option<f64> {
    let raw = match value {
        CellValue::Number(n) => return n.is_finite().then_some(*n),
        CellValue::Empty => return None,
        CellValue::Text(s) => s.trim().to_lowercase(),
    };

    if let Some(percent) = raw.strip_suffix('%') {
        return parse_number(&CellValue::Text(percent.to_string())).map(|n| n / 100.0);
    }

    let mut s = raw;
    for marker in CURRENCY_MARKERS {
        s = s.replace(marker, "");
    }
    let s: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\'')
        .collect();

    let normalized = match (s.rfind(','), s.rfind('.')) {
        // "1.234,56": dot groups thousands
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        // "1,234.56": comma groups thousands
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        _ => s,
    };

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Spreadsheet serial day 0.
fn serial_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    serial_epoch().checked_add_days(Days::new(serial.trunc() as u64))
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y"];

pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Number(n) => from_serial(*n),
        CellValue::Empty => None,
        CellValue::Text(s) => {
            // "2026-01-05T00:00:00" / "2026-01-05 00:00"
            let s = s.trim().split(['T', ' ']).next().unwrap_or_default();
            if let Some(date) = DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
            {
                return Some(date);
            }
            s.parse::<f64>().ok().and_then(from_serial)
        }
    }
}

pub fn parse_bool(value: &CellValue) -> Option<bool> {
    match value {
        CellValue::Number(n) => Some(*n != 0.0),
        CellValue::Empty => None,
        CellValue::Text(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "tak" | "t" | "x" => Some(true),
            "0" | "false" | "no" | "n" | "nie" | "f" | "" => Some(false),
            _ => None,
        },
    }
}

// ---------------------------------------------------------------------------
// Sales linkage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedSale {
    #[serde(flatten)]
    pub row: SalesRow,
    /// `None` when the SKU is not in the catalog; the row is kept for later mapping.
    pub product_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedSales {
    pub rows: Vec<LinkedSale>,
    pub linked: usize,
    /// Distinct unknown SKUs, in first-seen order.
    pub unmatched_skus: Vec<String>,
}

/// Attach catalog product ids to sales rows by SKU. Unknown SKUs keep a null link.
pub fn link_sales(rows: Vec<SalesRow>, catalog: &[InternalProduct]) -> LinkedSales {
    let by_sku: HashMap<String, &str> = catalog
        .iter()
        .map(|p| (sku_key(&p.sku), p.id.as_str()))
        .collect();

    let mut linked = 0;
    let mut unmatched_skus: Vec<String> = Vec::new();
    let rows = rows
        .into_iter()
        .map(|row| {
            let product_id = by_sku.get(&sku_key(&row.sku)).map(|id| id.to_string());
            if product_id.is_some() {
                linked += 1;
            } else if !unmatched_skus.contains(&row.sku) {
                unmatched_skus.push(row.sku.clone());
            }
            LinkedSale { row, product_id }
        })
        .collect();

    LinkedSales {
        rows,
        linked,
        unmatched_skus,
    }
}

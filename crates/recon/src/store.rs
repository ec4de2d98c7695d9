//! Persistence seam for price reconciliation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{CatalogPrice, PriceHistoryRecord, PriceObservation};
use crate::price_sync::PriceMutation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown product '{0}'")]
    UnknownProduct(String),
    #[error("product '{0}' already has an open price record")]
    OpenRecordExists(String),
    #[error("product '{0}' has no open price record")]
    NoOpenRecord(String),
}

/// Where price mutations land. Implementations must keep at most one open
/// history record per product.
pub trait PriceStore {
    fn update_catalog_price(&mut self, product_id: &str, price: f64) -> Result<(), StoreError>;
    fn close_history(&mut self, product_id: &str, valid_to: NaiveDate) -> Result<(), StoreError>;
    fn open_history(&mut self, record: &PriceHistoryRecord) -> Result<(), StoreError>;
    /// Insert, or replace the observation with the same (product, source, date).
    fn upsert_observation(&mut self, observation: &PriceObservation) -> Result<(), StoreError>;

    fn apply(&mut self, mutation: &PriceMutation) -> Result<(), StoreError> {
        match mutation {
            PriceMutation::UpdateCatalogPrice {
                product_id,
                new_price,
                ..
            } => self.update_catalog_price(product_id, *new_price),
            PriceMutation::CloseHistory {
                product_id,
                valid_to,
            } => self.close_history(product_id, *valid_to),
            PriceMutation::OpenHistory { record } => self.open_history(record),
            PriceMutation::InsertObservation { observation } => self.upsert_observation(observation),
        }
    }
}

type ObservationKey = (String, String, NaiveDate);

/// In-memory store used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    catalog: BTreeMap<String, CatalogPrice>,
    history: Vec<PriceHistoryRecord>,
    observations: BTreeMap<ObservationKey, PriceObservation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from catalog prices. Every product with a positive regular price
    /// gets an open history record starting `since`.
    pub fn from_catalog(prices: impl IntoIterator<Item = CatalogPrice>, since: NaiveDate) -> Self {
        let mut store = Self::new();
        for price in prices {
            if let Some(regular) = price.regular_price.filter(|p| *p > 0.0) {
                store.history.push(PriceHistoryRecord {
                    product_id: price.product_id.clone(),
                    valid_from: since,
                    valid_to: None,
                    regular_price: regular,
                    promo_price: price.active_promo,
                    cost_price: price.cost_price,
                });
            }
            store.catalog.insert(price.product_id.clone(), price);
        }
        store
    }

    pub fn catalog_price(&self, product_id: &str) -> Option<&CatalogPrice> {
        self.catalog.get(product_id)
    }

    /// Current catalog state, with the active promo taken from the open
    /// history record.
    pub fn catalog_prices(&self) -> Vec<CatalogPrice> {
        self.catalog
            .values()
            .map(|c| CatalogPrice {
                active_promo: self.open_record(&c.product_id).and_then(|r| r.promo_price),
                ..c.clone()
            })
            .collect()
    }

    pub fn open_record(&self, product_id: &str) -> Option<&PriceHistoryRecord> {
        self.history
            .iter()
            .find(|r| r.product_id == product_id && r.is_open())
    }

    pub fn history_for<'a>(&'a self, product_id: &'a str) -> impl Iterator<Item = &'a PriceHistoryRecord> {
        self.history.iter().filter(move |r| r.product_id == product_id)
    }

    pub fn history(&self) -> &[PriceHistoryRecord] {
        &self.history
    }

    pub fn observations(&self) -> impl Iterator<Item = &PriceObservation> {
        self.observations.values()
    }

    fn known(&self, product_id: &str) -> Result<(), StoreError> {
        if self.catalog.contains_key(product_id) {
            Ok(())
        } else {
            Err(StoreError::UnknownProduct(product_id.to_string()))
        }
    }
}

impl PriceStore for MemoryStore {
    fn update_catalog_price(&mut self, product_id: &str, price: f64) -> Result<(), StoreError> {
        let entry = self
            .catalog
            .get_mut(product_id)
            .ok_or_else(|| StoreError::UnknownProduct(product_id.to_string()))?;
        entry.regular_price = Some(price);
        Ok(())
    }

    fn close_history(&mut self, product_id: &str, valid_to: NaiveDate) -> Result<(), StoreError> {
        self.known(product_id)?;
        let record = self
            .history
            .iter_mut()
            .find(|r| r.product_id == product_id && r.is_open())
            .ok_or_else(|| StoreError::NoOpenRecord(product_id.to_string()))?;
        record.valid_to = Some(valid_to);
        Ok(())
    }

    fn open_history(&mut self, record: &PriceHistoryRecord) -> Result<(), StoreError> {
        self.known(&record.product_id)?;
        if self.open_record(&record.product_id).is_some() {
            return Err(StoreError::OpenRecordExists(record.product_id.clone()));
        }
        self.history.push(PriceHistoryRecord {
            valid_to: None,
            ..record.clone()
        });
        Ok(())
    }

    fn upsert_observation(&mut self, observation: &PriceObservation) -> Result<(), StoreError> {
        self.known(&observation.product_id)?;
        let key = (
            observation.product_id.clone(),
            observation.source.clone(),
            observation.date,
        );
        self.observations.insert(key, observation.clone());
        Ok(())
    }
}

//! Reference Catalog: transfer-partner graph and per-cabin point valuations.
//!
//! The catalog only changes through out-of-band reseeding, so it is loaded
//! once and held in memory for the process lifetime. Absent entries are
//! reported as `None`; default substitution happens in [`crate::valuation`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::flight::CabinClass;

/// A directed transfer edge from a bank currency to an airline program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPartner {
    pub source_program: String,
    pub destination_program: String,
    /// Points in : points out. Always positive.
    pub transfer_ratio: f64,
    /// 0 means instant.
    pub transfer_time_hours: i32,
}

/// Estimated value of one point for a program and cabin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsValuation {
    pub program: String,
    pub cabin_class: CabinClass,
    pub cents_per_point: f64,
}

/// Read-only lookups over the reference data.
pub trait ReferenceCatalog: Send + Sync {
    /// All direct transfer edges out of `source_program`.
    fn partners_of(&self, source_program: &str) -> Vec<TransferPartner>;

    /// Valuation for `(program, cabin)`, if the catalog has one.
    fn valuation_of(&self, program: &str, cabin: CabinClass) -> Option<f64>;

    /// Every valuation entry.
    fn all_valuations(&self) -> Vec<PointsValuation>;
}

// ---------------------------------------------------------------------------
// In-memory catalog
// ---------------------------------------------------------------------------

/// Catalog held entirely in memory, indexed for the engine's lookups.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    partners: HashMap<String, Vec<TransferPartner>>,
    valuations: HashMap<(String, CabinClass), f64>,
    valuation_list: Vec<PointsValuation>,
}

impl InMemoryCatalog {
    /// Build a catalog from raw rows.
    ///
    /// Edges with a non-positive ratio or negative latency are dropped with a
    /// warning. Edge order per source is preserved. A repeated valuation key
    /// keeps the last value.
    pub fn new(partners: Vec<TransferPartner>, valuations: Vec<PointsValuation>) -> Self {
        let mut by_source: HashMap<String, Vec<TransferPartner>> = HashMap::new();
        for partner in partners {
            if partner.transfer_ratio <= 0.0 || partner.transfer_time_hours < 0 {
                tracing::warn!(
                    source = %partner.source_program,
                    destination = %partner.destination_program,
                    ratio = partner.transfer_ratio,
                    hours = partner.transfer_time_hours,
                    "Skipping invalid transfer partner edge",
                );
                continue;
            }
            by_source
                .entry(partner.source_program.clone())
                .or_default()
                .push(partner);
        }

        let mut index = HashMap::new();
        let mut valuation_list: Vec<PointsValuation> = Vec::with_capacity(valuations.len());
        for v in valuations {
            let key = (v.program.clone(), v.cabin_class);
            if index.insert(key, v.cents_per_point).is_some() {
                valuation_list.retain(|existing| {
                    !(existing.program == v.program && existing.cabin_class == v.cabin_class)
                });
            }
            valuation_list.push(v);
        }

        Self {
            partners: by_source,
            valuations: index,
            valuation_list,
        }
    }

    /// The catalog the database migration seeds, for development and tests.
    pub fn seeded() -> Self {
        Self::new(seed_transfer_partners(), seed_valuations())
    }

    pub fn partner_count(&self) -> usize {
        self.partners.values().map(Vec::len).sum()
    }
}

impl ReferenceCatalog for InMemoryCatalog {
    fn partners_of(&self, source_program: &str) -> Vec<TransferPartner> {
        self.partners
            .get(source_program)
            .cloned()
            .unwrap_or_default()
    }

    fn valuation_of(&self, program: &str, cabin: CabinClass) -> Option<f64> {
        self.valuations.get(&(program.to_string(), cabin)).copied()
    }

    fn all_valuations(&self) -> Vec<PointsValuation> {
        self.valuation_list.clone()
    }
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

fn edge(source: &str, destination: &str, hours: i32) -> TransferPartner {
    TransferPartner {
        source_program: source.to_string(),
        destination_program: destination.to_string(),
        transfer_ratio: 1.0,
        transfer_time_hours: hours,
    }
}

/// Transfer edges matching `db/migrations` seed rows.
pub fn seed_transfer_partners() -> Vec<TransferPartner> {
    vec![
        edge("chase_ur", "united_mileageplus", 0),
        edge("chase_ur", "virgin_atlantic", 0),
        edge("chase_ur", "air_canada_aeroplan", 24),
        edge("chase_ur", "british_airways_avios", 24),
        edge("chase_ur", "singapore_krisflyer", 48),
        edge("amex_mr", "ana_mileage_club", 48),
        edge("amex_mr", "delta_skymiles", 0),
        edge("amex_mr", "british_airways_avios", 24),
        edge("amex_mr", "air_france_flying_blue", 24),
        edge("amex_mr", "singapore_krisflyer", 24),
        edge("capital_one", "air_canada_aeroplan", 24),
        edge("capital_one", "air_france_flying_blue", 24),
        edge("citi_ty", "singapore_krisflyer", 24),
        edge("citi_ty", "virgin_atlantic", 24),
    ]
}

/// Valuations matching `db/migrations` seed rows, economy to first per program.
pub fn seed_valuations() -> Vec<PointsValuation> {
    const TABLE: &[(&str, [f64; 4])] = &[
        ("united_mileageplus", [1.2, 1.5, 1.8, 2.2]),
        ("ana_mileage_club", [1.4, 1.7, 2.0, 2.5]),
        ("delta_skymiles", [1.1, 1.3, 1.5, 1.8]),
        ("american_aadvantage", [1.3, 1.5, 1.7, 2.0]),
        ("british_airways_avios", [1.2, 1.4, 1.6, 1.8]),
    ];

    TABLE
        .iter()
        .flat_map(|(program, values)| {
            CabinClass::ALL
                .iter()
                .zip(values.iter())
                .map(move |(cabin, value)| PointsValuation {
                    program: program.to_string(),
                    cabin_class: *cabin,
                    cents_per_point: *value,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partners_of_returns_direct_edges_in_order() {
        let catalog = InMemoryCatalog::seeded();
        let partners = catalog.partners_of("chase_ur");
        assert_eq!(partners.len(), 5);
        assert_eq!(partners[0].destination_program, "united_mileageplus");
        assert_eq!(partners[0].transfer_time_hours, 0);
    }

    #[test]
    fn partners_of_unknown_program_is_empty() {
        let catalog = InMemoryCatalog::seeded();
        assert!(catalog.partners_of("diners_club").is_empty());
    }

    #[test]
    fn valuation_lookup_hits_and_misses() {
        let catalog = InMemoryCatalog::seeded();
        assert_eq!(
            catalog.valuation_of("united_mileageplus", CabinClass::Business),
            Some(1.8)
        );
        assert_eq!(
            catalog.valuation_of("virgin_atlantic", CabinClass::Business),
            None
        );
    }

    #[test]
    fn seeded_catalog_sizes() {
        let catalog = InMemoryCatalog::seeded();
        assert_eq!(catalog.partner_count(), 14);
        assert_eq!(catalog.all_valuations().len(), 20);
    }

    #[test]
    fn invalid_edges_are_dropped() {
        let mut bad_ratio = edge("x", "y", 0);
        bad_ratio.transfer_ratio = 0.0;
        let bad_hours = edge("x", "z", -1);
        let catalog = InMemoryCatalog::new(vec![bad_ratio, bad_hours, edge("x", "w", 2)], vec![]);
        let partners = catalog.partners_of("x");
        assert_eq!(partners.len(), 1);
        assert_eq!(partners[0].destination_program, "w");
    }

    #[test]
    fn repeated_valuation_keeps_last_value() {
        let v = |cpp| PointsValuation {
            program: "p".into(),
            cabin_class: CabinClass::First,
            cents_per_point: cpp,
        };
        let catalog = InMemoryCatalog::new(vec![], vec![v(1.0), v(3.0)]);
        assert_eq!(catalog.valuation_of("p", CabinClass::First), Some(3.0));
        assert_eq!(catalog.all_valuations().len(), 1);
    }
}

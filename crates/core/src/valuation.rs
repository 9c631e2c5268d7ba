//! Valuation & Transfer Resolver.
//!
//! Pure functions over an award record, the traveler's held programs and the
//! [`ReferenceCatalog`]. This is the single place where a missing valuation
//! is replaced by [`DEFAULT_CENTS_PER_POINT`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::ReferenceCatalog;
use crate::flight::AwardRecord;

/// Valuation used when the catalog has no `(program, cabin)` entry.
pub const DEFAULT_CENTS_PER_POINT: f64 = 1.5;

/// Computed value of an award redemption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardValue {
    pub cents_per_point: f64,
    /// Whole US dollars.
    pub estimated_cash_value: i64,
}

/// Suggested transfer from a held currency into the award's program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDescriptor {
    pub source_program: String,
    pub destination_program: String,
    pub transfer_ratio: f64,
    pub transfer_time_hours: i32,
}

/// Value an award at the catalog's cents-per-point for its program and cabin.
///
/// `estimated_cash_value = round(miles * cpp / 100)`, rounding halves up.
pub fn value_of(catalog: &dyn ReferenceCatalog, award: &AwardRecord) -> AwardValue {
    let cents_per_point = catalog
        .valuation_of(&award.program, award.cabin_class)
        .unwrap_or(DEFAULT_CENTS_PER_POINT);

    AwardValue {
        cents_per_point,
        estimated_cash_value: cents_to_dollars(award.miles_required as f64 * cents_per_point),
    }
}

fn cents_to_dollars(cents: f64) -> i64 {
    // Miles and valuations are non-negative, so `round` (half away from zero)
    // is half-up here.
    (cents / 100.0).round() as i64
}

/// Pick the fastest direct transfer from any held program into `award_program`.
///
/// Ties on latency keep the first held program in iteration order. Returns
/// `None` when no held program has a direct edge; the award is still shown.
pub fn best_transfer_for(
    catalog: &dyn ReferenceCatalog,
    award_program: &str,
    held_programs: &[String],
) -> Option<TransferDescriptor> {
    let mut best: Option<TransferDescriptor> = None;

    for held in held_programs {
        let Some(edge) = catalog
            .partners_of(held)
            .into_iter()
            .find(|p| p.destination_program == award_program)
        else {
            continue;
        };

        let faster = best
            .as_ref()
            .map_or(true, |b| edge.transfer_time_hours < b.transfer_time_hours);
        if faster {
            best = Some(TransferDescriptor {
                source_program: held.clone(),
                destination_program: edge.destination_program,
                transfer_ratio: edge.transfer_ratio,
                transfer_time_hours: edge.transfer_time_hours,
            });
        }
    }

    best
}

/// Programs reachable from the held set in exactly one catalog hop.
///
/// `None` means no restriction (nothing held, so every program passes).
pub fn reachable_programs(
    catalog: &dyn ReferenceCatalog,
    held_programs: &[String],
) -> Option<HashSet<String>> {
    if held_programs.is_empty() {
        return None;
    }

    Some(
        held_programs
            .iter()
            .flat_map(|held| catalog.partners_of(held))
            .map(|p| p.destination_program)
            .collect(),
    )
}

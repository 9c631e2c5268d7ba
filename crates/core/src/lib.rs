//! Award/cash aggregation and points-valuation engine.
//!
//! This crate has no database or HTTP dependencies. Storage, caching and
//! identity resolution are reached through the collaborator traits in
//! [`repository`], [`cache`], [`usage`] and [`history`], so the engine and the
//! usage gate stay pure with respect to their explicit inputs.

pub mod cache;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod flight;
pub mod history;
pub mod metro;
pub mod ranking;
pub mod repository;
pub mod search;
pub mod types;
pub mod usage;
pub mod valuation;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

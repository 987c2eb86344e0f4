//! Econ Briefings - Grounded, versioned economic briefing documents
//!
//! This crate turns selected economic time series into briefing documents
//! whose every cited figure is traceable to a reproducible data pack, and
//! keeps each document as an append-only chain of immutable versions.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;

//! GTFS static schedule loader and query engine.
//!
//! Reads a GTFS archive (Irish Rail / Transport for Ireland by default),
//! validates every table and reference, and publishes an immutable
//! [`GtfsData`](schedule::GtfsData) that answers trip, stop, station board
//! and service calendar queries.

pub mod build;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod freshness;
pub mod load;
pub mod provider;
pub mod resolve;
pub mod schedule;
pub mod table;
pub mod web;

#[cfg(test)]
mod test_feed;

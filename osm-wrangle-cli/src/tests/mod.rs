//! Shared test harness modules for the OSM wrangling CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod end_to_end;
mod helpers;

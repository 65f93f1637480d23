//! Partition tests.
//!
//! This module contains the rule-by-rule validator tests, the end-to-end
//! scenarios, the store state machine, and usage queries.


/// End-to-end validation scenarios against the reference SoC.
pub mod scenarios;



/// Unit tests for individual validation rules.
pub mod validate;

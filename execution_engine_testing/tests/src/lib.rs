//! Integration tests of the vellum ledger core and its test harness.

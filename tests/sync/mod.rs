// Sync engine integration tests
// All deployment scenarios organized here

mod common;
mod gzip_tests;
mod reconcile_tests;

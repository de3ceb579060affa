//! Integration tests for cloudfs-cloudinary
//!
//! Uses wiremock to simulate the Cloudinary HTTP API for the client, and an
//! in-memory account for the adapter verbs and listing strategies in both
//! folder modes.

mod common;

mod test_listing;

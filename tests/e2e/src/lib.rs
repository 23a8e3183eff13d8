//! End-to-end test support for the Reverie workspace
//!
//! Shared harness and fixture code used by the integration test targets.

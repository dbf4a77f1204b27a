//! Cross-crate scenario tests for the GridLink workspace.
//!
//! These exercise the full message path: canonicalization, signing,
//! verification, forwarding decisions and routing through real
//! `NetworkingNode` instances wired over in-memory channels.

pub mod test_utils;

#[cfg(test)]
mod policy_scenario_tests;

#[cfg(test)]
mod relay_pipeline_tests;

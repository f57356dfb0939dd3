//! Shared test harness modules for the GemScout CLI.
#![expect(
    clippy::expect_used,
    reason = "Tests fail loudly on unexpected CLI outcomes"
)]

use super::*;

mod helpers;
mod pipeline;

//! HTTP 핸들러.

pub mod control;
pub mod info;
pub mod metrics;

//! Outbound analytics collector client.

mod ga4;

pub use ga4::{CollectorError, Ga4Collector};

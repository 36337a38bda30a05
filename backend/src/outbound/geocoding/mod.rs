//! Reverse geocoding adapters.

mod http_timezone_lookup;

pub use http_timezone_lookup::HttpTimezoneLookup;

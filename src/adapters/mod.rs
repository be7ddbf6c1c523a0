// Adapters layer: concrete implementations of the domain ports for real devices.

pub mod http;
pub mod raw_tcp;

pub use http::HttpScaleReader;
pub use raw_tcp::RawTcpPrinter;

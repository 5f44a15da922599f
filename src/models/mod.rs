/*!
Data models for the AS_PATH engine: AS numbers and their display formats,
path segments, and the path value itself.
*/
mod asn;
pub mod aspath;

pub use asn::*;
pub use aspath::*;

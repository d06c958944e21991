pub mod base;
pub mod reqwest_transport;

// Re-export the primary Transport items so code outside can do
// "use crate::transport::{Transport, ReqwestTransport};"
pub use base::{Transport, TransportError};
pub use reqwest_transport::ReqwestTransport;

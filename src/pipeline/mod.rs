//! The request pipeline: credential attachment, dispatch, refresh-and-retry
//! and error classification around every call.

pub mod client;

pub use client::{inspect_outcome, ApiClient};

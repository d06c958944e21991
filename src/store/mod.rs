pub mod credential_store;

// Re-export so code outside can do "use crate::store::CredentialStore;"
pub use credential_store::CredentialStore;

pub mod policy;
pub mod refresh;
pub mod session;

// Re-export the auth building blocks so callers can do "use crate::auth::*;"
pub use policy::{ExclusionPolicy, RefreshDecision};
pub use refresh::{RefreshCoordinator, RefreshError, RefreshResult};
pub use session::{ForcedLogout, NoopSessionHook, SessionHook};

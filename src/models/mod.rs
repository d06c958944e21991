pub mod credential;
pub mod envelope;
pub mod error;
pub mod request;

pub use credential::Credential;
pub use envelope::{ApiResponse, ResponseEnvelope};
pub use error::{ClassifiedError, ErrorKind, ErrorPayload, MessageSource};
pub use request::RequestDescriptor;

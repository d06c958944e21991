use serde::{Deserialize, Serialize};

/// The session credential: the current access token plus login state.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Credential {
    pub access_token: Option<String>,
    pub is_logged_in: bool,
}

impl Credential {
    pub fn logged_in(token: impl Into<String>) -> Self {
        Credential {
            access_token: Some(token.into()),
            is_logged_in: true,
        }
    }

    pub fn logged_out() -> Self {
        Credential::default()
    }
}

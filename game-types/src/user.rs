use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::UserId;

/// Caller identity supplied by the identity provider. Guests and
/// authenticated users look the same here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Principal {
    pub user_id: UserId,
    pub display_name: String,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

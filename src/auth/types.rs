use serde::Serialize;

use crate::identity::UserAccount;
use crate::permission::PermissionSet;

/// Result of a successful `authenticate` call.
#[derive(Debug, Clone, Serialize)]
pub struct LoginSuccess {
    pub account: UserAccount,
    pub permissions: PermissionSet,
    pub message: String,
    /// Role landing area, e.g. `/teacher`.
    pub redirect_to: &'static str,
}

impl LoginSuccess {
    pub(crate) fn new(account: UserAccount) -> Self {
        let message = format!("Welcome back, {}", account.identity().display_name());
        Self {
            permissions: account.permissions(),
            redirect_to: account.role().redirect_target(),
            message,
            account,
        }
    }
}

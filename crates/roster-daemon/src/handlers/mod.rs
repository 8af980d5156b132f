use std::sync::Arc;

use roster_client::LoadError;

use crate::session::Session;

mod detail;
mod session;
mod users;

pub use detail::handle_show_user;
pub use session::handle_describe_session;
pub use users::{
    handle_add_user, handle_delete_user, handle_edit_user, handle_list_users, handle_reload_users,
};

pub struct HandlerContext {
    pub session: Arc<Session>,
}

impl HandlerContext {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

/// Logs a failed load and turns it into the message shown to the user.
pub(crate) fn load_failure(what: &str, err: &LoadError) -> String {
    tracing::error!("{}: {}", what, err);
    format!("{}: {}", what, err)
}

/// Reports a failure that points at a daemon bug rather than bad input. The
/// CLI recognizes the prefix and appends the daemon log.
pub(crate) fn internal_error(what: &str, err: &dyn std::fmt::Display) -> String {
    tracing::error!("Internal error: {}: {}", what, err);
    format!("Internal error: {}: {}", what, err)
}

use roster_types::{ShowUserParams, ShowUserResult};

use super::{load_failure, HandlerContext};
use crate::session::Fetched;

pub async fn handle_show_user(
    ctx: &HandlerContext,
    params: ShowUserParams,
) -> Result<ShowUserResult, String> {
    match ctx.session.find_user(&params.id).await {
        Ok(Fetched::Applied(found)) => {
            let (user, source) = match found {
                Some((user, source)) => (Some(user), Some(source)),
                None => (None, None),
            };
            Ok(ShowUserResult {
                id: params.id,
                user,
                source,
            })
        }
        Ok(Fetched::Discarded) => Err("Detail view closed before the user loaded".to_string()),
        Err(e) => Err(load_failure("Failed to load user", &e)),
    }
}

use roster_types::{DescribeSessionParams, DescribeSessionResult};

use super::HandlerContext;

pub async fn handle_describe_session(
    ctx: &HandlerContext,
    _params: DescribeSessionParams,
) -> Result<DescribeSessionResult, String> {
    let (loaded, user_count) = ctx.session.store_state().await;

    Ok(DescribeSessionResult {
        daemon_pid: std::process::id(),
        api_base_url: ctx.session.api_base_url().to_string(),
        loaded,
        user_count: user_count as u32,
        default_sort: ctx.session.config().display.default_sort,
    })
}

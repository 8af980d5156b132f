use roster_store::UserForm;
use roster_types::{
    AddUserParams, AddUserResult, DeleteUserParams, DeleteUserResult, EditUserParams,
    EditUserResult, FieldErrors, ListUsersParams, ListUsersResult, ReloadUsersParams,
    ReloadUsersResult,
};

use super::{internal_error, load_failure, HandlerContext};
use crate::session::{AddOutcome, EditFields, EditOutcome, Fetched};

const LIST_LOAD_FAILED: &str = "Failed to load users";

async fn ensure_collection(ctx: &HandlerContext) -> Result<(), String> {
    ctx.session
        .ensure_loaded()
        .await
        .map_err(|e| load_failure(LIST_LOAD_FAILED, &e))
}

pub async fn handle_list_users(
    ctx: &HandlerContext,
    params: ListUsersParams,
) -> Result<ListUsersResult, String> {
    ensure_collection(ctx).await?;

    let sort = params
        .sort
        .unwrap_or(ctx.session.config().display.default_sort);
    let (users, total) = ctx.session.list_users(&params.query, sort).await;

    Ok(ListUsersResult {
        users,
        total: total as u32,
        query: params.query,
        sort,
    })
}

pub async fn handle_add_user(
    ctx: &HandlerContext,
    params: AddUserParams,
) -> Result<AddUserResult, String> {
    ensure_collection(ctx).await?;

    let form = UserForm::new(params.name, params.email, params.company);
    match ctx.session.add_user(form).await {
        AddOutcome::Added(user) => Ok(AddUserResult {
            user: Some(user),
            errors: FieldErrors::new(),
        }),
        AddOutcome::Invalid(errors) => Ok(AddUserResult {
            user: None,
            errors: errors.by_field(),
        }),
        AddOutcome::Rejected(e) => Err(internal_error("add-user", &e)),
    }
}

pub async fn handle_edit_user(
    ctx: &HandlerContext,
    params: EditUserParams,
) -> Result<EditUserResult, String> {
    ensure_collection(ctx).await?;

    let fields = EditFields {
        name: params.name,
        email: params.email,
        company: params.company,
    };
    let (found, user, errors) = match ctx.session.edit_user(&params.id, fields).await {
        EditOutcome::Updated(user) => (true, Some(user), FieldErrors::new()),
        EditOutcome::Invalid(errors) => (true, None, errors.by_field()),
        EditOutcome::NotFound => (false, None, FieldErrors::new()),
    };

    Ok(EditUserResult {
        id: params.id,
        found,
        user,
        errors,
    })
}

pub async fn handle_delete_user(
    ctx: &HandlerContext,
    params: DeleteUserParams,
) -> Result<DeleteUserResult, String> {
    ensure_collection(ctx).await?;

    let removed = ctx.session.delete_user(&params.id).await;
    Ok(DeleteUserResult {
        id: params.id,
        removed,
    })
}

pub async fn handle_reload_users(
    ctx: &HandlerContext,
    _params: ReloadUsersParams,
) -> Result<ReloadUsersResult, String> {
    match ctx.session.load_collection().await {
        Ok(Fetched::Applied(count)) => Ok(ReloadUsersResult {
            loaded: count as u32,
            discarded: false,
        }),
        Ok(Fetched::Discarded) => Ok(ReloadUsersResult {
            loaded: 0,
            discarded: true,
        }),
        Err(e) => Err(load_failure(LIST_LOAD_FAILED, &e)),
    }
}

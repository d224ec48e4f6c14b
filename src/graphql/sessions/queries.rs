use juniper::FieldError;
use uuid::Uuid;

use crate::{
    database::filters::Page,
    graphql::{Ctx, sessions::SessionListResponse},
    models::session::{Session, SessionFilter},
};

pub struct SessionQueryType;

#[juniper::graphql_object]
impl SessionQueryType {
    async fn by_id(ctx: &Ctx, id: Uuid) -> Result<Option<Session>, FieldError> {
        ctx.run(move |conn| Box::pin(async move { Session::find_one(conn, id).await }))
            .await
            .map_err(|e| ctx.field_error("get session", e))
    }

    /// Looks up a session by its client-side identifier.
    async fn by_session_id(ctx: &Ctx, session_id: String) -> Result<Option<Session>, FieldError> {
        ctx.run(move |conn| {
            Box::pin(async move { Session::find_one_by_session_id(conn, session_id).await })
        })
        .await
        .map_err(|e| ctx.field_error("get session", e))
    }

    async fn list(
        ctx: &Ctx,
        filter: Option<SessionFilter>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> SessionListResponse {
        let filter = filter.unwrap_or_default();
        let page = Page::new(limit, offset);
        match ctx
            .run(move |conn| Box::pin(async move { Session::list(conn, filter, page).await }))
            .await
        {
            Ok(listing) => SessionListResponse {
                success: true,
                message: format!("Retrieved {} sessions", listing.items.len()),
                items: listing.items,
                total_count: listing.total_count,
            },
            Err(e) => SessionListResponse {
                success: false,
                message: ctx.failure("list sessions", &e),
                items: vec![],
                total_count: 0,
            },
        }
    }

    async fn active_count(ctx: &Ctx, user_id: Option<Uuid>) -> Result<i32, FieldError> {
        ctx.run(move |conn| Box::pin(async move { Session::active_count(conn, user_id).await }))
            .await
            .map_err(|e| ctx.field_error("count active sessions", e))
    }
}

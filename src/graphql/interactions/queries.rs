use juniper::FieldError;
use uuid::Uuid;

use crate::{
    database::filters::Page,
    graphql::{Ctx, interactions::InteractionListResponse},
    models::user_interaction::{InteractionTypeCount, UserInteraction, UserInteractionFilter},
};

pub struct InteractionQueryType;

#[juniper::graphql_object]
impl InteractionQueryType {
    async fn by_id(ctx: &Ctx, id: Uuid) -> Result<Option<UserInteraction>, FieldError> {
        ctx.run(move |conn| Box::pin(async move { UserInteraction::find_one(conn, id).await }))
            .await
            .map_err(|e| ctx.field_error("get interaction", e))
    }

    async fn list(
        ctx: &Ctx,
        filter: Option<UserInteractionFilter>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> InteractionListResponse {
        let filter = filter.unwrap_or_default();
        let page = Page::new(limit, offset);
        match ctx
            .run(move |conn| Box::pin(async move { UserInteraction::list(conn, filter, page).await }))
            .await
        {
            Ok(listing) => InteractionListResponse {
                success: true,
                message: format!("Retrieved {} interactions", listing.items.len()),
                items: listing.items,
                total_count: listing.total_count,
            },
            Err(e) => InteractionListResponse {
                success: false,
                message: ctx.failure("list interactions", &e),
                items: vec![],
                total_count: 0,
            },
        }
    }

    async fn count(ctx: &Ctx, filter: Option<UserInteractionFilter>) -> Result<i32, FieldError> {
        let filter = filter.unwrap_or_default();
        ctx.run(move |conn| Box::pin(async move { UserInteraction::count(conn, filter).await }))
            .await
            .map_err(|e| ctx.field_error("count interactions", e))
    }

    /// Interaction counts per type, most frequent first.
    async fn summary(
        ctx: &Ctx,
        user_id: Option<Uuid>,
        session_id: Option<String>,
    ) -> Result<Vec<InteractionTypeCount>, FieldError> {
        ctx.run(move |conn| {
            Box::pin(async move { UserInteraction::summary(conn, user_id, session_id).await })
        })
        .await
        .map_err(|e| ctx.field_error("summarize interactions", e))
    }
}

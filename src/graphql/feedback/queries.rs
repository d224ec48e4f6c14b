use juniper::FieldError;
use uuid::Uuid;

use crate::{
    database::filters::Page,
    graphql::{Ctx, feedback::FeedbackListResponse},
    models::feedback::{Feedback, FeedbackFilter},
};

pub struct FeedbackQueryType;

#[juniper::graphql_object]
impl FeedbackQueryType {
    async fn by_id(ctx: &Ctx, id: Uuid) -> Result<Option<Feedback>, FieldError> {
        ctx.run(move |conn| Box::pin(async move { Feedback::find_one(conn, id).await }))
            .await
            .map_err(|e| ctx.field_error("get feedback", e))
    }

    async fn list(
        ctx: &Ctx,
        filter: Option<FeedbackFilter>,
        limit: Option<i32>,
        offset: Option<i32>,
    ) -> FeedbackListResponse {
        list(ctx, filter.unwrap_or_default(), Page::new(limit, offset)).await
    }

    async fn count(
        ctx: &Ctx,
        user_id: Option<Uuid>,
        feedback_type: Option<String>,
    ) -> Result<i32, FieldError> {
        ctx.run(move |conn| Box::pin(async move { Feedback::count(conn, user_id, feedback_type).await }))
            .await
            .map_err(|e| ctx.field_error("count feedback", e))
    }
}

pub async fn list(ctx: &Ctx, filter: FeedbackFilter, page: Page) -> FeedbackListResponse {
    match ctx
        .run(move |conn| Box::pin(async move { Feedback::list(conn, filter, page).await }))
        .await
    {
        Ok(listing) => FeedbackListResponse {
            success: true,
            message: format!("Retrieved {} feedback entries", listing.items.len()),
            items: listing.items,
            total_count: listing.total_count,
        },
        Err(e) => FeedbackListResponse {
            success: false,
            message: ctx.failure("list feedback", &e),
            items: vec![],
            total_count: 0,
        },
    }
}

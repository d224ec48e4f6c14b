use uuid::Uuid;

use crate::{
    graphql::{Ctx, DeleteResponse, feedback::FeedbackResponse},
    models::feedback::{Feedback, FeedbackInput, FeedbackUpdateInput},
};

pub struct FeedbackMutationType;

#[juniper::graphql_object]
impl FeedbackMutationType {
    async fn create(ctx: &Ctx, input: FeedbackInput) -> FeedbackResponse {
        create(ctx, input).await
    }

    async fn update(ctx: &Ctx, id: Uuid, input: FeedbackUpdateInput) -> FeedbackResponse {
        update(ctx, id, input).await
    }

    async fn delete(ctx: &Ctx, id: Uuid) -> DeleteResponse {
        delete(ctx, id).await
    }
}

pub async fn create(ctx: &Ctx, input: FeedbackInput) -> FeedbackResponse {
    match ctx
        .run(move |conn| Box::pin(async move { Feedback::create(conn, input).await }))
        .await
    {
        Ok(feedback) => FeedbackResponse {
            success: true,
            message: "Feedback created successfully".to_string(),
            feedback: Some(feedback),
        },
        Err(e) => FeedbackResponse {
            success: false,
            message: ctx.failure("create feedback", &e),
            feedback: None,
        },
    }
}

pub async fn update(ctx: &Ctx, id: Uuid, input: FeedbackUpdateInput) -> FeedbackResponse {
    match ctx
        .run(move |conn| Box::pin(async move { Feedback::update(conn, id, input).await }))
        .await
    {
        Ok(Some(feedback)) => FeedbackResponse {
            success: true,
            message: "Feedback updated successfully".to_string(),
            feedback: Some(feedback),
        },
        Ok(None) => FeedbackResponse {
            success: false,
            message: "Feedback not found".to_string(),
            feedback: None,
        },
        Err(e) => FeedbackResponse {
            success: false,
            message: ctx.failure("update feedback", &e),
            feedback: None,
        },
    }
}

pub async fn delete(ctx: &Ctx, id: Uuid) -> DeleteResponse {
    let result = ctx
        .run(move |conn| Box::pin(async move { Feedback::delete(conn, id).await }))
        .await;
    DeleteResponse::from_result(ctx, "Feedback", result)
}

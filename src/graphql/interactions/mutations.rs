use uuid::Uuid;

use crate::{
    graphql::{Ctx, DeleteResponse, interactions::InteractionResponse},
    models::user_interaction::{UserInteraction, UserInteractionInput},
};

pub struct InteractionMutationType;

#[juniper::graphql_object]
impl InteractionMutationType {
    async fn create(ctx: &Ctx, input: UserInteractionInput) -> InteractionResponse {
        match ctx
            .run(move |conn| Box::pin(async move { UserInteraction::create(conn, input).await }))
            .await
        {
            Ok(interaction) => InteractionResponse {
                success: true,
                message: "Interaction recorded successfully".to_string(),
                interaction: Some(interaction),
            },
            Err(e) => InteractionResponse {
                success: false,
                message: ctx.failure("record interaction", &e),
                interaction: None,
            },
        }
    }

    /// Merges a JSON object into the stored `data`.
    async fn update_data(ctx: &Ctx, id: Uuid, data: String) -> InteractionResponse {
        match ctx
            .run(move |conn| Box::pin(async move { UserInteraction::update_data(conn, id, data).await }))
            .await
        {
            Ok(Some(interaction)) => InteractionResponse {
                success: true,
                message: "Interaction data updated successfully".to_string(),
                interaction: Some(interaction),
            },
            Ok(None) => InteractionResponse {
                success: false,
                message: "Interaction not found".to_string(),
                interaction: None,
            },
            Err(e) => InteractionResponse {
                success: false,
                message: ctx.failure("update interaction data", &e),
                interaction: None,
            },
        }
    }

    async fn delete(ctx: &Ctx, id: Uuid) -> DeleteResponse {
        let result = ctx
            .run(move |conn| Box::pin(async move { UserInteraction::delete(conn, id).await }))
            .await;
        DeleteResponse::from_result(ctx, "Interaction", result)
    }
}

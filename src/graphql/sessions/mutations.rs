use uuid::Uuid;

use crate::{
    graphql::{Ctx, DeleteResponse, sessions::SessionResponse},
    models::session::{Session, SessionInput, SessionUpdateInput},
};

pub struct SessionMutationType;

#[juniper::graphql_object]
impl SessionMutationType {
    async fn create(ctx: &Ctx, input: SessionInput) -> SessionResponse {
        match ctx
            .run(move |conn| Box::pin(async move { Session::create(conn, input).await }))
            .await
        {
            Ok(session) => SessionResponse::ok("Session created successfully", session),
            Err(e) => SessionResponse::failed(ctx.failure("create session", &e)),
        }
    }

    async fn update(ctx: &Ctx, id: Uuid, input: SessionUpdateInput) -> SessionResponse {
        match ctx
            .run(move |conn| Box::pin(async move { Session::update(conn, id, input).await }))
            .await
        {
            Ok(Some(session)) => SessionResponse::ok("Session updated successfully", session),
            Ok(None) => SessionResponse::failed("Session not found".to_string()),
            Err(e) => SessionResponse::failed(ctx.failure("update session", &e)),
        }
    }

    /// Ends an active session and records its duration.
    async fn end(ctx: &Ctx, id: Uuid) -> SessionResponse {
        match ctx
            .run(move |conn| Box::pin(async move { Session::end(conn, id).await }))
            .await
        {
            Ok(Some(session)) => SessionResponse::ok("Session ended successfully", session),
            Ok(None) => SessionResponse::failed("Session not found or already ended".to_string()),
            Err(e) => SessionResponse::failed(ctx.failure("end session", &e)),
        }
    }

    async fn increment_interactions(ctx: &Ctx, id: Uuid) -> SessionResponse {
        match ctx
            .run(move |conn| Box::pin(async move { Session::increment_interactions(conn, id).await }))
            .await
        {
            Ok(Some(session)) => SessionResponse::ok("Interaction count incremented", session),
            Ok(None) => SessionResponse::failed("Session not found".to_string()),
            Err(e) => SessionResponse::failed(ctx.failure("increment interaction count", &e)),
        }
    }

    async fn delete(ctx: &Ctx, id: Uuid) -> DeleteResponse {
        let result = ctx
            .run(move |conn| Box::pin(async move { Session::delete(conn, id).await }))
            .await;
        DeleteResponse::from_result(ctx, "Session", result)
    }
}

use juniper::GraphQLObject;

use crate::models::session::Session;

pub mod mutations;
pub mod queries;

#[derive(Debug, Clone, GraphQLObject)]
pub struct SessionResponse {
    pub success: bool,
    pub message: String,
    pub session: Option<Session>,
}

impl SessionResponse {
    pub fn ok(message: &str, session: Session) -> Self {
        SessionResponse {
            success: true,
            message: message.to_string(),
            session: Some(session),
        }
    }

    pub fn failed(message: String) -> Self {
        SessionResponse {
            success: false,
            message,
            session: None,
        }
    }
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct SessionListResponse {
    pub success: bool,
    pub message: String,
    pub items: Vec<Session>,
    pub total_count: i32,
}

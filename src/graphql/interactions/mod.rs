use juniper::GraphQLObject;

use crate::models::user_interaction::UserInteraction;

pub mod mutations;
pub mod queries;

#[derive(Debug, Clone, GraphQLObject)]
pub struct InteractionResponse {
    pub success: bool,
    pub message: String,
    pub interaction: Option<UserInteraction>,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct InteractionListResponse {
    pub success: bool,
    pub message: String,
    pub items: Vec<UserInteraction>,
    pub total_count: i32,
}

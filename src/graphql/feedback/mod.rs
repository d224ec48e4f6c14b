use juniper::GraphQLObject;

use crate::models::feedback::Feedback;

pub mod mutations;
pub mod queries;

#[derive(Debug, Clone, GraphQLObject)]
pub struct FeedbackResponse {
    pub success: bool,
    pub message: String,
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct FeedbackListResponse {
    pub success: bool,
    pub message: String,
    pub items: Vec<Feedback>,
    /// Rows matching the filter, ignoring pagination.
    pub total_count: i32,
}

use std::sync::Arc;

use futures::future::BoxFuture;
use juniper::{Context, EmptySubscription, FieldError, GraphQLObject, RootNode, graphql_object};
use juniper_rocket::{GraphQLRequest, GraphQLResponse};
use rocket::{Route, State, get, post, response::content::RawHtml};
use tracing::error;

use crate::{
    config::Settings,
    database::{Db, DatabaseError, connector::PgHandle},
    graphql::{
        feedback::{mutations::FeedbackMutationType, queries::FeedbackQueryType},
        interactions::{mutations::InteractionMutationType, queries::InteractionQueryType},
        sessions::{mutations::SessionMutationType, queries::SessionQueryType},
    },
};

pub mod feedback;
pub mod interactions;
pub mod sessions;

pub fn routes(debug: bool) -> Vec<Route> {
    if debug {
        routes![graphiql, graphql]
    } else {
        routes![graphql]
    }
}

pub struct Ctx {
    pub db: Arc<Db>,
    /// Appends error details to client-facing messages.
    pub debug: bool,
}

impl Context for Ctx {}

impl Ctx {
    /// Runs `operation` on one connection that is released afterwards.
    pub async fn run<T, F>(&self, operation: F) -> Result<T, DatabaseError>
    where
        F: for<'c> FnOnce(&'c mut PgHandle) -> BoxFuture<'c, Result<T, DatabaseError>>,
    {
        self.db.with_connection(operation).await
    }

    /// Logs `e` and renders the message returned to the client. Details are
    /// only included in debug mode.
    pub fn failure(&self, action: &str, e: &DatabaseError) -> String {
        error!("[{}] {}", action, e);
        match e {
            DatabaseError::Validation(reason) => format!("Failed to {}: {}", action, reason),
            _ if self.debug => format!("Failed to {}: {}", action, e),
            _ => format!("Failed to {}", action),
        }
    }

    pub fn field_error(&self, action: &str, e: DatabaseError) -> FieldError {
        FieldError::from(self.failure(action, &e))
    }
}

#[derive(Debug, Clone, GraphQLObject)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    /// `record` is the capitalised record name used in messages.
    pub fn from_result(ctx: &Ctx, record: &str, result: Result<bool, DatabaseError>) -> Self {
        match result {
            Ok(true) => DeleteResponse {
                success: true,
                message: format!("{} deleted successfully", record),
            },
            Ok(false) => DeleteResponse {
                success: false,
                message: format!("{} not found", record),
            },
            Err(e) => DeleteResponse {
                success: false,
                message: ctx.failure(&format!("delete {}", record.to_lowercase()), &e),
            },
        }
    }
}

pub struct Query;

#[graphql_object(context = Ctx)]
impl Query {
    async fn feedback() -> FeedbackQueryType {
        FeedbackQueryType
    }

    async fn sessions() -> SessionQueryType {
        SessionQueryType
    }

    async fn interactions() -> InteractionQueryType {
        InteractionQueryType
    }
}

pub struct Mutation;

#[graphql_object(context = Ctx)]
impl Mutation {
    async fn feedback() -> FeedbackMutationType {
        FeedbackMutationType
    }

    async fn sessions() -> SessionMutationType {
        SessionMutationType
    }

    async fn interactions() -> InteractionMutationType {
        InteractionMutationType
    }
}

pub type Schema = RootNode<'static, Query, Mutation, EmptySubscription<Ctx>>;

pub fn schema() -> Schema {
    Schema::new(Query, Mutation, EmptySubscription::new())
}

#[get("/graphiql")]
pub fn graphiql() -> RawHtml<String> {
    juniper_rocket::graphiql_source("/graphql", None)
}

#[post("/", data = "<request>")]
pub async fn graphql(
    request: GraphQLRequest,
    schema: &State<Schema>,
    db: &State<Arc<Db>>,
    settings: &State<Settings>,
) -> GraphQLResponse {
    let ctx = Ctx {
        db: db.inner().clone(),
        debug: settings.debug,
    };
    request.execute(schema, &ctx).await
}

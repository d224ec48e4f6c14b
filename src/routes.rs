//! Service info and health endpoints.

use std::sync::Arc;

use rocket::{Route, State, get, http::Status, serde::json::Json};
use serde::Serialize;

use crate::{
    config::Settings,
    database::{
        Db,
        health::{HealthReport, probe},
    },
};

pub fn routes() -> Vec<Route> {
    routes![index, liveness, database_health]
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub graphql: &'static str,
    pub graphiql: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub environment: String,
    pub debug: bool,
    pub database_mode: &'static str,
}

#[get("/")]
pub fn index(settings: &State<Settings>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        graphql: "/graphql",
        graphiql: settings.debug.then_some("/graphql/graphiql"),
    })
}

/// Liveness only; never touches the database.
#[get("/health")]
pub fn liveness(settings: &State<Settings>) -> Json<Liveness> {
    Json(Liveness {
        status: "healthy",
        environment: settings.environment.clone(),
        debug: settings.debug,
        database_mode: settings.database.mode.as_str(),
    })
}

#[get("/health/database")]
pub async fn database_health(
    db: &State<Arc<Db>>,
    settings: &State<Settings>,
) -> (Status, Json<HealthReport>) {
    let report = probe(db.inner().as_ref(), settings.debug).await;
    let status = if report.reachable {
        Status::Ok
    } else {
        Status::ServiceUnavailable
    };
    (status, Json(report))
}

#[cfg(test)]
mod tests {
    use rocket::local::asynchronous::Client;

    use super::*;
    use crate::database::{Database, PgConnector};

    async fn client(vars: &[(&str, &str)]) -> Client {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let settings = Settings::from_lookup(move |name| {
            vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
        });
        let db = Arc::new(Database::new(settings.database.clone(), PgConnector));
        let rocket = rocket::build().mount("/", routes()).manage(settings).manage(db);
        Client::tracked(rocket).await.unwrap()
    }

    #[rocket::async_test]
    async fn test_health_reports_mode() {
        let client = client(&[("DATABASE_MODE", "per_request"), ("ENVIRONMENT", "staging")]).await;
        let response = client.get("/health").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["database_mode"], "per_request");
        assert_eq!(body["environment"], "staging");
    }

    #[rocket::async_test]
    async fn test_database_health_without_configuration_is_unavailable() {
        let client = client(&[]).await;
        let response = client.get("/health/database").dispatch().await;

        assert_eq!(response.status(), Status::ServiceUnavailable);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["reachable"], false);
        assert!(body["host"].is_null());
        assert_eq!(body["error"], "database unreachable");
    }

    #[rocket::async_test]
    async fn test_database_health_details_in_debug() {
        let client = client(&[("DEBUG", "true")]).await;
        let response = client.get("/health/database").dispatch().await;

        assert_eq!(response.status(), Status::ServiceUnavailable);
        let body: serde_json::Value = response.into_json().await.unwrap();
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("no database connection string configured"));
    }

    #[rocket::async_test]
    async fn test_index_hides_graphiql_outside_debug() {
        let client = client(&[]).await;
        let body: serde_json::Value = client.get("/").dispatch().await.into_json().await.unwrap();
        assert_eq!(body["graphql"], "/graphql");
        assert!(body["graphiql"].is_null());
    }
}

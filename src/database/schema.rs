//! Schema Initialisation
//!
//! Creates the three application tables and their indexes. Every statement is
//! idempotent, so running this on each start-up is safe.

use crate::database::{acquire::Database, connector::Connector, connector::QueryExecutor, error::DatabaseError};

const CREATE_SESSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    session_id TEXT NOT NULL,
    url TEXT,
    start_time TIMESTAMPTZ DEFAULT NOW(),
    end_time TIMESTAMPTZ,
    duration INTEGER,
    interaction_count INTEGER DEFAULT 0,
    is_active BOOLEAN DEFAULT TRUE,
    created_at TIMESTAMPTZ DEFAULT NOW(),
    updated_at TIMESTAMPTZ DEFAULT NOW()
)
"#;

const CREATE_FEEDBACK: &str = r#"
CREATE TABLE IF NOT EXISTS feedback (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL,
    feedback_type VARCHAR(50),
    feedback TEXT NOT NULL,
    startup_name VARCHAR(255),
    created_at TIMESTAMPTZ DEFAULT NOW(),
    updated_at TIMESTAMPTZ DEFAULT NOW()
)
"#;

const CREATE_USER_INTERACTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS user_interactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    session_id TEXT NOT NULL,
    user_id UUID NOT NULL,
    interaction_type TEXT NOT NULL,
    timestamp TIMESTAMPTZ DEFAULT NOW(),
    url TEXT,
    element_info JSONB,
    data JSONB,
    created_at TIMESTAMPTZ DEFAULT NOW()
)
"#;

/// `(index name, table, columns)`
const INDEXES: [(&str, &str, &str); 11] = [
    ("idx_sessions_user_active", "sessions", "user_id, is_active"),
    ("idx_sessions_start_time", "sessions", "start_time"),
    ("idx_sessions_end_time", "sessions", "end_time"),
    ("idx_feedback_user_type", "feedback", "user_id, feedback_type"),
    ("idx_feedback_startup", "feedback", "startup_name"),
    ("idx_feedback_created_at", "feedback", "created_at"),
    ("idx_user_interactions_session", "user_interactions", "session_id"),
    ("idx_user_interactions_user", "user_interactions", "user_id"),
    ("idx_user_interactions_type", "user_interactions", "interaction_type"),
    ("idx_user_interactions_timestamp", "user_interactions", "timestamp"),
    (
        "idx_user_interactions_session_user",
        "user_interactions",
        "session_id, user_id",
    ),
];

pub fn statements() -> Vec<String> {
    let mut statements = vec![
        CREATE_SESSIONS.to_string(),
        CREATE_FEEDBACK.to_string(),
        CREATE_USER_INTERACTIONS.to_string(),
    ];
    for (name, table, columns) in INDEXES {
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            name, table, columns
        ));
    }
    statements
}

/// Runs every DDL statement on a single connection.
pub async fn init_schema<C: Connector>(db: &Database<C>) -> Result<(), DatabaseError> {
    db.with_connection(|conn| {
        Box::pin(async move {
            for statement in statements() {
                conn.execute(&statement, vec![])
                    .await
                    .map_err(|e| DatabaseError::SchemaInit(e.to_string()))?;
            }
            Ok(())
        })
    })
    .await
}

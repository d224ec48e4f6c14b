//! Database Value Types
//!
//! This module provides the `DatabaseValue` enum, a single parameter type that
//! every query helper binds. Each variant wraps an `Option` so a NULL still
//! carries the PostgreSQL type of its column; binding an untyped NULL against a
//! `uuid` or `timestamptz` column makes the server reject the statement.
//!
//! ## Features
//!
//! - **Typed NULLs**: `None` inside any variant encodes as SQL NULL of that type
//! - **Automatic Conversion**: `From` implementations for the Rust types the models use
//! - **SQLx Integration**: Implements `Encode` and `Type` so values bind directly

use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo};
use sqlx::{Encode, Postgres, Type, encode::IsNull, error::BoxDynError};
use time::OffsetDateTime;
use uuid::Uuid;

/// A bindable query parameter.
///
/// # Examples
///
/// ```rust,ignore
/// use crate::database::values::DatabaseValue;
///
/// let value: DatabaseValue = "hello".into();
/// let value: DatabaseValue = Some(42i32).into();
/// let value: DatabaseValue = Uuid::new_v4().into();
/// let value = DatabaseValue::Text(None); // NULL::text
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Text(Option<String>),
    Int(Option<i32>),
    Int64(Option<i64>),
    Boolean(Option<bool>),
    Uuid(Option<Uuid>),
    DateTime(Option<OffsetDateTime>),
    Json(Option<JsonValue>),
}

impl DatabaseValue {
    pub fn is_null(&self) -> bool {
        match self {
            DatabaseValue::Text(v) => v.is_none(),
            DatabaseValue::Int(v) => v.is_none(),
            DatabaseValue::Int64(v) => v.is_none(),
            DatabaseValue::Boolean(v) => v.is_none(),
            DatabaseValue::Uuid(v) => v.is_none(),
            DatabaseValue::DateTime(v) => v.is_none(),
            DatabaseValue::Json(v) => v.is_none(),
        }
    }
}

impl<'q> Encode<'q, Postgres> for DatabaseValue {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        match self {
            DatabaseValue::Text(s) => Encode::<Postgres>::encode_by_ref(s, buf),
            DatabaseValue::Int(i) => Encode::<Postgres>::encode_by_ref(i, buf),
            DatabaseValue::Int64(i) => Encode::<Postgres>::encode_by_ref(i, buf),
            DatabaseValue::Boolean(b) => Encode::<Postgres>::encode_by_ref(b, buf),
            DatabaseValue::Uuid(u) => Encode::<Postgres>::encode_by_ref(u, buf),
            DatabaseValue::DateTime(dt) => Encode::<Postgres>::encode_by_ref(dt, buf),
            DatabaseValue::Json(j) => Encode::<Postgres>::encode_by_ref(j, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            DatabaseValue::Text(_) => <String as Type<Postgres>>::type_info(),
            DatabaseValue::Int(_) => <i32 as Type<Postgres>>::type_info(),
            DatabaseValue::Int64(_) => <i64 as Type<Postgres>>::type_info(),
            DatabaseValue::Boolean(_) => <bool as Type<Postgres>>::type_info(),
            DatabaseValue::Uuid(_) => <Uuid as Type<Postgres>>::type_info(),
            DatabaseValue::DateTime(_) => <OffsetDateTime as Type<Postgres>>::type_info(),
            DatabaseValue::Json(_) => <JsonValue as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for DatabaseValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("text")
    }
}

impl From<&str> for DatabaseValue {
    fn from(s: &str) -> Self {
        DatabaseValue::Text(Some(s.to_string()))
    }
}

impl From<String> for DatabaseValue {
    fn from(s: String) -> Self {
        DatabaseValue::Text(Some(s))
    }
}

impl From<Option<String>> for DatabaseValue {
    fn from(s: Option<String>) -> Self {
        DatabaseValue::Text(s)
    }
}

impl From<i32> for DatabaseValue {
    fn from(i: i32) -> Self {
        DatabaseValue::Int(Some(i))
    }
}

impl From<Option<i32>> for DatabaseValue {
    fn from(i: Option<i32>) -> Self {
        DatabaseValue::Int(i)
    }
}

impl From<i64> for DatabaseValue {
    fn from(i: i64) -> Self {
        DatabaseValue::Int64(Some(i))
    }
}

impl From<bool> for DatabaseValue {
    fn from(b: bool) -> Self {
        DatabaseValue::Boolean(Some(b))
    }
}

impl From<Option<bool>> for DatabaseValue {
    fn from(b: Option<bool>) -> Self {
        DatabaseValue::Boolean(b)
    }
}

impl From<Uuid> for DatabaseValue {
    fn from(u: Uuid) -> Self {
        DatabaseValue::Uuid(Some(u))
    }
}

impl From<Option<Uuid>> for DatabaseValue {
    fn from(u: Option<Uuid>) -> Self {
        DatabaseValue::Uuid(u)
    }
}

impl From<OffsetDateTime> for DatabaseValue {
    fn from(dt: OffsetDateTime) -> Self {
        DatabaseValue::DateTime(Some(dt))
    }
}

impl From<Option<OffsetDateTime>> for DatabaseValue {
    fn from(dt: Option<OffsetDateTime>) -> Self {
        DatabaseValue::DateTime(dt)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(j: JsonValue) -> Self {
        DatabaseValue::Json(Some(j))
    }
}

impl From<Option<JsonValue>> for DatabaseValue {
    fn from(j: Option<JsonValue>) -> Self {
        DatabaseValue::Json(j)
    }
}

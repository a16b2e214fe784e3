use thiserror::Error;
use type_mapping::ConversionError;
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("No result: a single-result query matched no rows")]
    NoResult,

    #[error("Non-unique result: a single-result query matched {count} rows")]
    NonUniqueResult { count: usize },

    #[error("Could not initialize {entity} {id}: the originating session has ended")]
    LazyInitialization { entity: &'static str, id: Uuid },

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Session is closed")]
    SessionClosed,

    #[error("Decode error: {0}")]
    Decode(#[from] ConversionError),

    #[error("Malformed row: projection expects {expected} columns, row has {found}")]
    MalformedRow { expected: usize, found: usize },

    #[error("Database error during {operation}: {source}")]
    Database {
        operation: String,
        #[source]
        source: BoxError,
    },
}

impl QueryError {
    pub fn translation(message: impl Into<String>) -> Self {
        QueryError::Translation(message.into())
    }

    pub fn database(operation: impl Into<String>, source: impl Into<BoxError>) -> Self {
        QueryError::Database {
            operation: operation.into(),
            source: source.into(),
        }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(err: sqlx::Error) -> Self {
        QueryError::database("sqlx", err)
    }
}

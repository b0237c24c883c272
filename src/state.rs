use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::IdentityResolver;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub identity: Arc<dyn IdentityResolver>,
}

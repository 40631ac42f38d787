use std::sync::Arc;

use sqlx::PgPool;
use tera::Tera;

use crate::quote::QuoteProvider;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub templates: Arc<Tera>,
    pub quotes: Arc<dyn QuoteProvider>,
}

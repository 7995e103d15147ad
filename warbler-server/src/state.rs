use std::sync::Arc;
use tera::Tera;

use crate::db::Database;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub session_manager: SessionManager,
    pub templates: Arc<Tera>,
}

impl AppState {
    pub fn new(db: Database, templates: Tera) -> Self {
        let session_manager = SessionManager::new(db.clone());
        Self::with_session_manager(db, session_manager, templates)
    }

    pub fn with_session_manager(
        db: Database,
        session_manager: SessionManager,
        templates: Tera,
    ) -> Self {
        Self {
            db,
            session_manager,
            templates: Arc::new(templates),
        }
    }
}

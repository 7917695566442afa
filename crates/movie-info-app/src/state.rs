use std::sync::Arc;

use movie_info_dal::Pool;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(pool: Pool) -> Self {
        AppState {
            state: Arc::new(AppStateInner { pool }),
        }
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }
}

struct AppStateInner {
    pool: Pool,
}

// axum-valid's `Garde` extractor requires the garde validation context (`()`
// here) to be extractable from the router state.
impl axum::extract::FromRef<AppState> for () {
    fn from_ref(_state: &AppState) {}
}

use std::sync::Arc;

use kino_dal::Pool;
use url::Url;

#[derive(Clone)]
pub struct AppState {
    state: Arc<AppStateInner>,
}

impl AppState {
    pub fn new(app_config: AppConfig, pool: Pool) -> Self {
        AppState {
            state: Arc::new(AppStateInner { app_config, pool }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.state.app_config
    }

    pub fn pool(&self) -> &Pool {
        &self.state.pool
    }
}

struct AppStateInner {
    pool: Pool,
    app_config: AppConfig,
}

// axum-valid resolves the unit garde context through FromRef
impl axum::extract::FromRef<AppState> for () {
    fn from_ref(_: &AppState) {}
}

pub struct AppConfig {
    pub base_url: Url,
    pub default_page_size: u32,
}

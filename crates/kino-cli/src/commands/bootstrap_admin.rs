use clap::Parser;
use kino_dal::user::{ADMIN_USERNAME, UserRepository};
use tracing::info;

use crate::commands::Executor;
use crate::config::BackendConfig;

#[derive(Parser, Debug)]
pub struct BootstrapAdminCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(
        short,
        long,
        env = "KINO_ADMIN_PASSWORD",
        default_value = "complexpassword123",
        help = "Password for the admin account, only used when the account does not exist yet"
    )]
    pub password: String,
}

impl Executor for BootstrapAdminCmd {
    async fn run(self) -> anyhow::Result<()> {
        let pool = kino_dal::new_pool(&self.backend.database_url()).await?;
        kino_dal::migrate(&pool).await?;
        let repository = UserRepository::new(pool);
        let user = repository.ensure_admin(&self.password).await?;
        info!("Administrative account '{}' present with id {}", ADMIN_USERNAME, user.id);

        Ok(())
    }
}

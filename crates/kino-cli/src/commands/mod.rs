pub mod bootstrap_admin;

use crate::config::Commands;

#[allow(async_fn_in_trait)]
pub trait Executor {
    async fn run(self) -> anyhow::Result<()>;
}

impl Executor for Commands {
    async fn run(self) -> anyhow::Result<()> {
        match self {
            Commands::BootstrapAdmin(cmd) => cmd.run().await,
        }
    }
}

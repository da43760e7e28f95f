//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, JobArgs, OutputFormat, TokenAction};
use crate::client::{CatalogApi, CatalogClient};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::jobs::JobHandle;
use crate::results::{Endpoint, JobResult};
use crate::validate::QueryParams;
use serde_json::Value;
use tracing::debug;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let client = CatalogClient::new(self.load_config()?)?;

        let output = match &self.cli.command {
            Commands::Token { action } => self.token(&client, *action).await?,
            Commands::Get { path, query } => {
                let query: QueryParams = query.iter().cloned().collect();
                client.get_all(path, query).await?.into_json()
            }
            Commands::Job(args) => self.job(&client, args).await?,
        };

        self.output_message(&output);
        Ok(())
    }

    /// Load configuration: file, then environment, then flags
    fn load_config(&self) -> Result<ClientConfig> {
        let config = match &self.cli.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        let mut config = config.with_env_overrides()?;
        if let Some(url) = &self.cli.base_url {
            config.base_url.clone_from(url);
        }
        debug!(?config, "Loaded client configuration");
        Ok(config)
    }

    async fn token(&self, client: &CatalogClient, action: TokenAction) -> Result<Value> {
        let auth = client.auth();
        match action {
            TokenAction::Create => Ok(serde_json::to_value(auth.create_access_token().await?)?),
            TokenAction::Validate => {
                Ok(serde_json::to_value(auth.validate_access_token(None).await?)?)
            }
            TokenAction::Revoke => Ok(serde_json::to_value(auth.revoke_access_tokens().await?)?),
        }
    }

    async fn job(&self, client: &CatalogClient, args: &JobArgs) -> Result<Value> {
        let handle = match (&args.id, &args.name) {
            (Some(id), _) => JobHandle::Id(*id),
            (None, Some(name)) => JobHandle::Name(name.clone()),
            (None, None) => return Err(Error::config("either --id or --name is required")),
        };
        let endpoint: Endpoint = args.endpoint.parse()?;

        let record = client.poll_job(&handle).await?;
        Ok(serde_json::to_value(JobResult::from_record(record, endpoint))?)
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

use clap::Parser;

use crate::config::{AppConfig, ConfigError, GatewayBackend};

#[derive(Debug, Parser)]
#[command(name = "microcredit-api")]
#[command(about = "Microcredit back-office API server")]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Port to listen on (overrides API_PORT / PORT)")]
    pub port: Option<u16>,

    #[arg(long, value_enum, help = "Data gateway backend (overrides GATEWAY_BACKEND)")]
    pub gateway: Option<GatewayBackend>,

    #[arg(long, help = "Validate configuration, print it and exit")]
    pub check_config: bool,
}

impl Cli {
    /// Environment configuration with command-line overrides applied, validated
    pub fn config(&self, source: impl Fn(&str) -> Option<String>) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::load(source)?;
        if let Some(port) = self.port {
            config.api.port = port;
        }
        if let Some(backend) = self.gateway {
            config.gateway.backend = backend;
        }
        config.validate()?;
        Ok(config)
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use anyhow::{Result, anyhow};

/// Environment variable that overrides the configured API base URL. Read by
/// the CLI at run time and baked in as the production default at build time.
pub const API_URL_ENV: &str = "ARCHCHAT_API_URL";

const DEVELOPMENT_API_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Debug builds talk to a local backend, release builds to production
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Environment::Development
        } else {
            Environment::Production
        }
    }

    /// Base URL baked in for this environment, if any
    pub fn default_api_url(&self) -> Option<&'static str> {
        match self {
            Environment::Development => Some(DEVELOPMENT_API_URL),
            Environment::Production => option_env!("ARCHCHAT_API_URL"),
        }
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(anyhow!("Unknown environment: {}", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub environment: Option<String>,
    pub api_url: Option<String>,
    pub download_dir: Option<String>,
}

/// Values given on the command line (or its environment variables); they
/// win over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub environment: Option<Environment>,
    pub download_dir: Option<PathBuf>,
}

/// Settings after applying overrides, environment variables and defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub environment: Environment,
    pub api_url: String,
    pub download_dir: PathBuf,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Settings as they would be written back to the config file
    pub fn from_resolved(resolved: &ResolvedConfig) -> Self {
        Self {
            environment: Some(resolved.environment.as_str().to_string()),
            api_url: Some(resolved.api_url.clone()),
            download_dir: Some(resolved.download_dir.display().to_string()),
        }
    }

    pub fn resolve(&self, overrides: Overrides) -> Result<ResolvedConfig> {
        let environment = match (overrides.environment, &self.environment) {
            (Some(env), _) => env,
            (None, Some(name)) => name
                .parse()
                .map_err(|_| anyhow!("Unknown environment in config: {}", name))?,
            (None, None) => Environment::for_build(),
        };

        let api_url = overrides
            .api_url
            .or_else(|| self.api_url.clone())
            .or_else(|| environment.default_api_url().map(str::to_string))
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow!(
                "No API URL configured for {}. Pass --api-url or set {}",
                environment.as_str(),
                API_URL_ENV
            ))?;

        let download_dir = overrides
            .download_dir
            .or_else(|| self.download_dir.as_ref().map(PathBuf::from))
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(ResolvedConfig {
            environment,
            api_url,
            download_dir,
        })
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("archchat"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.json"))
    }
}

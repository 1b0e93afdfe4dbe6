use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    pub queue: QueueConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Visibility timeout in seconds: how long a leased task stays
    /// invisible before it becomes eligible for redelivery
    pub visibility_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding the snapshot file
    pub checkpoint_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            network: NetworkConfig {
                host: "0.0.0.0".to_string(),
                port: 5555,
            },
            queue: QueueConfig {
                visibility_timeout_secs: 300,
            },
            persistence: PersistenceConfig {
                checkpoint_dir: PathBuf::from("./"),
            },
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ServerConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.network.host, self.network.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_knobs() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:5555");
        assert_eq!(config.queue.visibility_timeout_secs, 300);
        assert_eq!(config.persistence.checkpoint_dir, PathBuf::from("./"));
    }

    #[test]
    fn yaml_roundtrip() {
        let config = ServerConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: ServerConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.bind_addr(), config.bind_addr());
    }
}

use serde::Deserialize;
use std::fs;

#[derive(Deserialize, Clone)]
pub struct Config {
    pub bind_addr: Option<String>,
    pub geocoder_url: String,
    pub overpass_url: String,
    pub agent_url: String,
    pub agent_model: String,
    pub thread_count: Option<usize>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let path = if std::path::Path::new("poimap.toml").exists() {
            "poimap.toml"
        } else if std::path::Path::new("poimap.example.toml").exists() {
            "poimap.example.toml"
        } else {
            return Err(anyhow::anyhow!("Configuration file not found. Please create poimap.toml or provide poimap.example.toml."));
        };

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

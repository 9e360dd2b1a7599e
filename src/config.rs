use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub session: SessionDefaults,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

/// Defaults applied when the caller does not supply a full session config
#[derive(Debug, Deserialize)]
pub struct SessionDefaults {
    pub prep_countdown_secs: u32,
    pub seconds_per_question: u32,
    pub question_count: usize,
    pub allow_rerecording: bool,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

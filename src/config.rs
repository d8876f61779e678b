use crate::errors::{ConfigError, DatadisError, Result};
use datadis_api::{ApiConfig, Credentials};
use datadis_utils::mask_secret;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_USERNAME: &str = "DATADIS_USERNAME";
const ENV_CIF: &str = "DATADIS_CIF";
const ENV_PASSWORD: &str = "DATADIS_PASSWORD";
const ENV_BASE_URL: &str = "DATADIS_BASE_URL";
const ENV_API_BASE: &str = "DATADIS_API_BASE";
const ENV_TIMEOUT: &str = "DATADIS_TIMEOUT_SECS";
const ENV_RETRIES: &str = "DATADIS_RETRIES";

/// Configuration manager for Datadis
///
/// Values come from an INI file with `[auth]`, `[api]` and `[http]`
/// sections; environment variables take precedence over the file.
#[derive(Debug, Clone)]
pub struct Config {
    config_path: PathBuf,
    data: ini::Ini,
    use_env: bool,
}

impl Config {
    /// Load the config from the default location
    pub fn new() -> Result<Self> {
        let config_path = get_config_dir()?.join("config.ini");
        Self::load_from(config_path)
    }

    /// Load the config from an explicit path; a missing file is an empty config
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = path.into();

        let data = if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            ini::Ini::load_from_file(&config_path)
                .map_err(|e| ConfigError::IniError(e.to_string()))?
        } else {
            debug!("No config file at {}", config_path.display());
            ini::Ini::new()
        };

        Ok(Config {
            config_path,
            data,
            use_env: true,
        })
    }

    /// Ignore environment overrides and read the file only
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Save the configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .map_err(|e| ConfigError::DirectoryCreationFailed(e.to_string()))?;
            }
        }

        self.data
            .write_to_file(&self.config_path)
            .map_err(DatadisError::Io)?;
        Ok(())
    }

    /// Get a configuration value
    pub fn get_value(&self, section: &str, key: &str) -> Option<String> {
        self.data
            .get_from(Some(section), key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Set a configuration value
    pub fn set_value(&mut self, section: &str, key: &str, value: &str) {
        self.data.with_section(Some(section)).set(key, value);
    }

    /// Remove a configuration value
    pub fn unset_value(&mut self, section: &str, key: &str) {
        if let Some(section_map) = self.data.section_mut(Some(section)) {
            section_map.remove(key);
        }
    }

    fn env_or(&self, vars: &[&str], section: &str, key: &str) -> Option<String> {
        if self.use_env {
            for var in vars {
                if let Ok(value) = std::env::var(var) {
                    if !value.trim().is_empty() {
                        return Some(value.trim().to_string());
                    }
                }
            }
        }
        self.get_value(section, key)
    }

    pub fn get_username(&self) -> Option<String> {
        self.env_or(&[ENV_USERNAME, ENV_CIF], "auth", "username")
    }

    pub fn set_username(&mut self, username: &str) {
        self.set_value("auth", "username", username)
    }

    pub fn get_password(&self) -> Option<String> {
        self.env_or(&[ENV_PASSWORD], "auth", "password")
    }

    pub fn set_password(&mut self, password: &str) {
        self.set_value("auth", "password", password)
    }

    pub fn get_base_url(&self) -> Option<String> {
        self.env_or(&[ENV_BASE_URL], "api", "base_url")
    }

    pub fn get_api_base(&self) -> Option<String> {
        self.env_or(&[ENV_API_BASE], "api", "api_base")
    }

    pub fn get_timeout(&self) -> Result<Option<Duration>> {
        Ok(self
            .parse_number::<u64>(&[ENV_TIMEOUT], "http", "timeout_secs")?
            .map(Duration::from_secs))
    }

    pub fn get_retries(&self) -> Result<Option<u32>> {
        self.parse_number(&[ENV_RETRIES], "http", "retries")
    }

    fn parse_number<T: std::str::FromStr>(
        &self,
        vars: &[&str],
        section: &str,
        key: &str,
    ) -> Result<Option<T>> {
        match self.env_or(vars, section, key) {
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                ConfigError::InvalidValue {
                    field: format!("{}.{}", section, key),
                    value: raw,
                }
                .into()
            }),
            None => Ok(None),
        }
    }

    /// Show all configuration as a formatted string, password masked
    pub fn show_config(&self) -> String {
        let mut output = String::new();

        for (section_name, section) in self.data.iter() {
            if let Some(section_name) = section_name {
                output.push_str(&format!("[{}]\n", section_name));
            }

            for (key, value) in section.iter() {
                if key == "password" {
                    output.push_str(&format!("{} = {}\n", key, mask_secret(value)));
                } else {
                    output.push_str(&format!("{} = {}\n", key, value));
                }
            }
            output.push('\n');
        }

        output
    }
}

impl ApiConfig for Config {
    type Error = DatadisError;

    fn get_credentials(&self) -> Result<Credentials> {
        let username = self
            .get_username()
            .ok_or_else(|| ConfigError::MissingField("auth.username".to_string()))?;
        let password = self
            .get_password()
            .ok_or_else(|| ConfigError::MissingField("auth.password".to_string()))?;
        Ok(Credentials::new(username, password))
    }

    fn get_base_url(&self) -> Result<Option<String>> {
        Ok(Config::get_base_url(self))
    }

    fn get_api_base(&self) -> Result<Option<String>> {
        Ok(Config::get_api_base(self))
    }

    fn get_timeout(&self) -> Result<Option<Duration>> {
        Config::get_timeout(self)
    }

    fn get_retries(&self) -> Result<Option<u32>> {
        Config::get_retries(self)
    }
}

/// Load configuration, reading a `.env` file first if one exists
pub fn load_config() -> Result<Config> {
    if let Ok(path) = dotenv::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }
    Config::new()
}

/// Get configuration directory path
fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        ConfigError::NotFound("could not determine the user config directory".to_string())
    })?;

    Ok(config_dir.join("datadis"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.ini");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_sections() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "[auth]\nusername = 12345678A\npassword = secret\n\n\
             [api]\nbase_url = http://localhost:8080\n\n\
             [http]\ntimeout_secs = 15\nretries = 5\n",
        );

        let config = Config::load_from(path).unwrap().without_env();

        assert_eq!(config.get_username().as_deref(), Some("12345678A"));
        assert_eq!(config.get_password().as_deref(), Some("secret"));
        assert_eq!(config.get_base_url().as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.get_api_base(), None);
        assert_eq!(config.get_timeout().unwrap(), Some(Duration::from_secs(15)));
        assert_eq!(config.get_retries().unwrap(), Some(5));
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(dir.path().join("absent.ini"))
            .unwrap()
            .without_env();

        assert_eq!(config.get_username(), None);
        let err = config.get_credentials().unwrap_err();
        assert!(matches!(
            err,
            DatadisError::Config(ConfigError::MissingField(ref field)) if field == "auth.username"
        ));
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[http]\nretries = many\n");
        let config = Config::load_from(path).unwrap().without_env();

        let err = config.get_retries().unwrap_err();
        assert!(err.to_string().contains("http.retries"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = Config::load_from(&path).unwrap().without_env();
        config.set_username("12345678A");
        config.set_password("secret-password");
        config.set_value("http", "retries", "2");
        config.save().unwrap();

        let reloaded = Config::load_from(&path).unwrap().without_env();
        assert_eq!(reloaded.get_username().as_deref(), Some("12345678A"));
        assert_eq!(reloaded.get_retries().unwrap(), Some(2));

        let shown = reloaded.show_config();
        assert!(shown.contains("[auth]"));
        assert!(!shown.contains("secret-password"));

        let mut reloaded = reloaded;
        reloaded.unset_value("http", "retries");
        assert_eq!(reloaded.get_retries().unwrap(), None);
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[api]\napi_base = http://file.example\n");

        std::env::set_var(ENV_API_BASE, "http://env.example");
        let config = Config::load_from(path).unwrap();
        let api_base = config.get_api_base();
        std::env::remove_var(ENV_API_BASE);

        assert_eq!(api_base.as_deref(), Some("http://env.example"));
    }
}

use crate::config::{load_config, Config};
use crate::errors::Result;
use datadis_api::{Datadis, DatadisClient};
use log::debug;

/// Build a client from the user's config file and environment
pub fn connect() -> Result<Datadis> {
    let config = load_config()?;
    connect_with(&config)
}

/// Build a client from an already loaded config
pub fn connect_with(config: &Config) -> Result<Datadis> {
    debug!("Connecting with config from {}", config.config_path().display());
    let client = DatadisClient::from_config(config)?;
    Ok(Datadis::from_client(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ConfigError, DatadisError};
    use std::fs;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_connect_with_file_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/nikola-auth/tokens/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("file-token"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.ini");
        fs::write(
            &config_path,
            format!(
                "[auth]\nusername = 12345678A\npassword = secret\n\n\
                 [api]\nbase_url = {uri}\napi_base = {uri}\n\n\
                 [http]\ntimeout_secs = 5\nretries = 0\n",
                uri = server.uri()
            ),
        )
        .unwrap();

        let config = Config::load_from(config_path).unwrap().without_env();
        let mut sdk = connect_with(&config).unwrap();
        sdk.authenticate().await.unwrap();

        let info = sdk.client_info();
        assert!(info.authenticated);
        assert_eq!(info.username, "12345678A");
    }

    #[test]
    fn test_connect_without_credentials_fails() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(dir.path().join("config.ini"))
            .unwrap()
            .without_env();

        let err = connect_with(&config).unwrap_err();
        assert!(matches!(
            err,
            DatadisError::Config(ConfigError::MissingField(_))
        ));
    }
}

use anyhow::Context;
use breakwater_components::payment::PaymentPollConfig;
use breakwater_components::rpc::lnd::grpc::config::{LndGrpcClientAuth, LndGrpcClientConfig};
use breakwater_service_api::network::Network;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CliConfig {
    pub lnd: LndConfig,
    #[serde(default)]
    pub payment: PaymentPollConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LndConfig {
    pub url: Url,
    pub network: Network,
    pub rpc_timeout_secs: f64,
    pub auth: LndGrpcClientAuth,
}

impl LndConfig {
    pub fn client_config(&self) -> LndGrpcClientConfig {
        LndGrpcClientConfig {
            url: self.url.clone(),
            network: self.network,
            auth: self.auth.clone(),
        }
    }

    pub fn rpc_timeout(&self) -> anyhow::Result<Duration> {
        Duration::try_from_secs_f64(self.rpc_timeout_secs)
            .with_context(|| format!("invalid rpc-timeout-secs {}", self.rpc_timeout_secs))
    }
}

impl CliConfig {
    pub fn load(config_path: &Path) -> anyhow::Result<Self> {
        info!("loading configuration file: {config_path:?}");

        let config_content = std::fs::read_to_string(config_path).with_context(|| {
            format!(
                "reading configuration file '{}'",
                config_path.to_string_lossy()
            )
        })?;

        let expanded_config = shellexpand::env(&config_content).with_context(|| {
            format!(
                "expanding configuration file env vars '{}'",
                config_path.to_string_lossy()
            )
        })?;

        let config: CliConfig = serde_saphyr::from_str(&expanded_config).with_context(|| {
            format!(
                "parsing YAML configuration from file '{}'",
                config_path.to_string_lossy()
            )
        })?;

        config.lnd.rpc_timeout()?;

        info!("configuration loaded successfully: {config:?}");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn load_when_complete_then_parses_all_sections() {
        let file = write_config(
            r#"
lnd:
  url: https://127.0.0.1:10009
  network: regtest
  rpc-timeout-secs: 30
  auth:
    type: path
    tls-cert-path: /lnd/tls.cert
    macaroon-path: /lnd/admin.macaroon
payment:
  poll-interval-secs: 5
  max-poll-attempts: 10
"#,
        );

        let config = CliConfig::load(file.path()).unwrap();

        assert_eq!(config.lnd.url.as_str(), "https://127.0.0.1:10009/");
        assert_eq!(config.lnd.network, Network::Regtest);
        assert_eq!(config.lnd.rpc_timeout().unwrap(), Duration::from_secs(30));
        let LndGrpcClientAuth::Path(auth) = &config.lnd.auth;
        assert_eq!(auth.tls_cert_path, PathBuf::from("/lnd/tls.cert"));
        assert_eq!(config.payment.poll_interval, Duration::from_secs(5));
        assert_eq!(config.payment.max_poll_attempts, Some(10));

        let client_config = config.lnd.client_config();
        assert_eq!(client_config.network, Network::Regtest);
    }

    #[test]
    fn load_when_payment_section_missing_then_defaults() {
        let file = write_config(
            r#"
lnd:
  url: https://127.0.0.1:10009
  network: mainnet
  rpc-timeout-secs: 2.5
  auth:
    type: path
    tls-cert-path: /lnd/tls.cert
    macaroon-path: /lnd/admin.macaroon
"#,
        );

        let config = CliConfig::load(file.path()).unwrap();

        assert_eq!(config.payment, PaymentPollConfig::default());
        assert_eq!(
            config.lnd.rpc_timeout().unwrap(),
            Duration::from_millis(2500)
        );
    }

    #[test]
    fn load_when_env_var_referenced_then_expanded() {
        std::env::set_var("BREAKWATER_TEST_MACAROON", "/secrets/admin.macaroon");
        let file = write_config(
            r#"
lnd:
  url: https://127.0.0.1:10009
  network: signet
  rpc-timeout-secs: 10
  auth:
    type: path
    tls-cert-path: /lnd/tls.cert
    macaroon-path: ${BREAKWATER_TEST_MACAROON}
"#,
        );

        let config = CliConfig::load(file.path()).unwrap();

        let LndGrpcClientAuth::Path(auth) = &config.lnd.auth;
        assert_eq!(auth.macaroon_path, PathBuf::from("/secrets/admin.macaroon"));
    }

    #[test]
    fn load_when_unknown_network_then_rejected() {
        let file = write_config(
            r#"
lnd:
  url: https://127.0.0.1:10009
  network: moonnet
  rpc-timeout-secs: 10
  auth:
    type: path
    tls-cert-path: /lnd/tls.cert
    macaroon-path: /lnd/admin.macaroon
"#,
        );

        assert!(CliConfig::load(file.path()).is_err());
    }

    #[test]
    fn load_when_negative_timeout_then_rejected() {
        let file = write_config(
            r#"
lnd:
  url: https://127.0.0.1:10009
  network: regtest
  rpc-timeout-secs: -1
  auth:
    type: path
    tls-cert-path: /lnd/tls.cert
    macaroon-path: /lnd/admin.macaroon
"#,
        );

        assert!(CliConfig::load(file.path()).is_err());
    }

    #[test]
    fn load_when_file_missing_then_error_names_path() {
        let err = CliConfig::load(Path::new("/nonexistent/breakwater.yaml")).unwrap_err();
        assert!(format!("{err:?}").contains("/nonexistent/breakwater.yaml"));
    }
}

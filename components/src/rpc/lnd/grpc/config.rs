use breakwater_service_api::network::Network;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LndGrpcClientConfig {
    pub url: Url,
    pub network: Network,
    pub auth: LndGrpcClientAuth,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[serde(tag = "type")]
pub enum LndGrpcClientAuth {
    Path(LndGrpcClientAuthPath),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LndGrpcClientAuthPath {
    pub tls_cert_path: PathBuf,
    pub macaroon_path: PathBuf,
}

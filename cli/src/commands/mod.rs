use crate::config::CliConfig;
use anyhow::Context;
use breakwater_components::client::LightningClient;
use breakwater_components::rpc::lnd::grpc::client::LndGrpcClient;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::io::{Stdout, Write};
use std::path::Path;

pub mod channel;
pub mod node;
pub mod payment;

pub type CliLightningClient = LightningClient<LndGrpcClient>;

pub fn connect(config: &CliConfig) -> anyhow::Result<CliLightningClient> {
    let rpc = LndGrpcClient::create(config.lnd.rpc_timeout()?, config.lnd.client_config());
    Ok(LightningClient::new(
        rpc,
        config.lnd.network,
        config.payment,
    ))
}

enum CliWrite {
    Stdout(Stdout),
    File(File),
}

impl CliWrite {
    pub fn stdout() -> Self {
        Self::Stdout(io::stdout())
    }

    pub fn file(file: File) -> Self {
        Self::File(file)
    }

    pub fn create<P: AsRef<Path>>(path: Option<P>) -> io::Result<Self> {
        match path {
            None => Ok(Self::stdout()),
            Some(path) => Self::file_create(path),
        }
    }

    pub fn file_create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        if path.as_ref().to_string_lossy() == "-" {
            Ok(Self::stdout())
        } else {
            Ok(Self::file(File::create(path)?))
        }
    }
}

impl Write for CliWrite {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            CliWrite::Stdout(w) => w.write(buf),
            CliWrite::File(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            CliWrite::Stdout(w) => w.flush(),
            CliWrite::File(w) => w.flush(),
        }
    }
}

pub fn cli_write_all<P: AsRef<Path>>(path: Option<P>, buf: &[u8]) -> io::Result<()> {
    let mut w = CliWrite::create(path)?;
    w.write_all(buf)?;
    w.flush()?;
    Ok(())
}

/// Writes `value` as pretty JSON followed by a newline.
pub fn cli_write_json<P: AsRef<Path>, T: Serialize>(
    path: Option<P>,
    value: &T,
) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(value).with_context(|| "serializing output")?;
    json.push('\n');
    cli_write_all(path, json.as_bytes()).with_context(|| "writing output")
}

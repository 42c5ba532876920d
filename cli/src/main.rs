mod commands;
mod config;
mod signals;

use crate::config::CliConfig;
use clap::{Parser, Subcommand};
use log::{error, LevelFilter};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::process::ExitCode;

/// LND node client
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// log level; overrides RUST_LOG
    #[clap(short, long, value_parser)]
    log_level: Option<LevelFilter>,

    /// Path to the YAML configuration file.
    #[clap(short, long, value_parser)]
    config: PathBuf,

    #[clap(subcommand)]
    command: RootCommands,
}

#[derive(Subcommand, Debug)]
enum RootCommands {
    /// Pay a BOLT 11 invoice and wait for the outcome
    Pay {
        /// BOLT 11 payment request
        invoice: String,

        /// Maximum routing fee, in satoshis
        #[clap(long, value_parser)]
        max_fee_sat: u64,

        /// Force the first hop through this channel
        #[clap(long, value_parser)]
        outgoing_chan_id: Option<u64>,

        /// Abandon the payment if it has not resolved after this many seconds
        #[clap(long, value_parser)]
        timeout_secs: Option<f64>,

        /// Output path, or `-` for stdout
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
    },
    /// Close a channel and follow its progress
    CloseChannel {
        /// Funding outpoint, as `txid:index`
        channel_point: String,

        /// Unilateral close
        #[clap(long)]
        force: bool,
    },
    /// Show node identity and sync state
    Info {
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
    },
    /// Show the confirmed on-chain wallet balance
    Balance {
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
    },
    /// List open channels
    Channels {
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
    },
    /// Create an invoice on the node
    Invoice {
        #[clap(long, value_parser)]
        amount_msat: Option<u64>,

        #[clap(long, value_parser)]
        memo: Option<String>,

        /// Commit to the memo by its SHA-256 instead of embedding it
        #[clap(long, requires = "memo")]
        hash_memo: bool,

        /// Hex SHA-256 of the description, instead of a memo
        #[clap(long, value_parser, conflicts_with_all = ["memo", "hash_memo"])]
        description_hash: Option<String>,

        #[clap(long, value_parser)]
        expiry_secs: Option<u64>,

        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
    },
    /// Open a channel to a connected peer and wait for the funding transaction
    OpenChannel {
        /// Peer identity public key
        peer: String,

        /// Channel capacity funded from the on-chain wallet
        #[clap(long, value_parser)]
        local_sat: u64,

        /// Amount given to the peer on open
        #[clap(long, value_parser, default_value_t = 0)]
        push_sat: u64,

        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,
    },
    /// Connect to a peer
    Connect {
        /// Peer identity public key
        peer: String,

        /// Peer address, as `host:port`
        host: String,
    },
}

#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let RootCommands::Pay { .. } | RootCommands::CloseChannel { .. } = args.command {
        match args.log_level {
            None => {
                if let Err(e) = env_logger::try_init() {
                    eprintln!("failed to initialize env_logger: {e}");
                    return ExitCode::FAILURE;
                }
            }
            Some(level) => {
                if let Err(e) = env_logger::builder().filter_level(level).try_init() {
                    eprintln!("failed to initialize env_logger: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
    } else {
        let level = args.log_level.unwrap_or(LevelFilter::Warn);
        if let Err(e) = TermLogger::init(
            level,
            ConfigBuilder::new()
                .set_time_level(LevelFilter::Off)
                .build(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ) {
            eprintln!("failed to initialize TermLogger: {e}");
            return ExitCode::FAILURE;
        }
    }

    match _main(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

async fn _main(args: CliArgs) -> anyhow::Result<()> {
    let config = CliConfig::load(&args.config)?;

    match args.command {
        RootCommands::Pay {
            invoice,
            max_fee_sat,
            outgoing_chan_id,
            timeout_secs,
            output,
        } => {
            commands::payment::pay(
                &config,
                invoice,
                max_fee_sat,
                outgoing_chan_id,
                timeout_secs,
                output.as_deref(),
            )
            .await
        }
        RootCommands::CloseChannel {
            channel_point,
            force,
        } => commands::channel::close_channel(&config, &channel_point, force).await,
        RootCommands::Info { output } => commands::node::info(&config, output.as_deref()).await,
        RootCommands::Balance { output } => {
            commands::node::balance(&config, output.as_deref()).await
        }
        RootCommands::Channels { output } => {
            commands::channel::list_channels(&config, output.as_deref()).await
        }
        RootCommands::Invoice {
            amount_msat,
            memo,
            hash_memo,
            description_hash,
            expiry_secs,
            output,
        } => {
            commands::node::invoice(
                &config,
                amount_msat,
                memo.as_deref(),
                hash_memo,
                description_hash.as_deref(),
                expiry_secs,
                output.as_deref(),
            )
            .await
        }
        RootCommands::OpenChannel {
            peer,
            local_sat,
            push_sat,
            output,
        } => {
            commands::channel::open_channel(&config, &peer, local_sat, push_sat, output.as_deref())
                .await
        }
        RootCommands::Connect { peer, host } => {
            commands::node::connect_peer(&config, &peer, &host).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_args_when_verified_then_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn cli_args_when_pay_then_parses_flags() {
        let args = CliArgs::try_parse_from([
            "bwtr",
            "--config",
            "/etc/breakwater.yaml",
            "pay",
            "lnbcrt1example",
            "--max-fee-sat",
            "10",
            "--outgoing-chan-id",
            "123",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("/etc/breakwater.yaml"));
        match args.command {
            RootCommands::Pay {
                invoice,
                max_fee_sat,
                outgoing_chan_id,
                timeout_secs,
                output,
            } => {
                assert_eq!(invoice, "lnbcrt1example");
                assert_eq!(max_fee_sat, 10);
                assert_eq!(outgoing_chan_id, Some(123));
                assert_eq!(timeout_secs, None);
                assert_eq!(output, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_args_when_close_channel_forced_then_parses() {
        let args = CliArgs::try_parse_from([
            "bwtr",
            "-c",
            "cfg.yaml",
            "close-channel",
            "1111111111111111111111111111111111111111111111111111111111111111:0",
            "--force",
        ])
        .unwrap();

        assert!(matches!(
            args.command,
            RootCommands::CloseChannel { force: true, .. }
        ));
    }

    #[test]
    fn cli_args_when_open_channel_then_push_defaults_to_zero() {
        let args = CliArgs::try_parse_from([
            "bwtr",
            "-c",
            "cfg.yaml",
            "open-channel",
            "02eec7245d6b7d2ccb30380bfbe2a3648cd7a942653f5aa340edcea1f283686619",
            "--local-sat",
            "100000",
        ])
        .unwrap();

        assert!(matches!(
            args.command,
            RootCommands::OpenChannel {
                local_sat: 100_000,
                push_sat: 0,
                ..
            }
        ));
    }

    #[test]
    fn cli_args_when_hash_memo_without_memo_then_rejected() {
        assert!(
            CliArgs::try_parse_from(["bwtr", "-c", "cfg.yaml", "invoice", "--hash-memo"]).is_err()
        );
        assert!(CliArgs::try_parse_from([
            "bwtr",
            "-c",
            "cfg.yaml",
            "invoice",
            "--memo",
            "coffee",
            "--hash-memo",
        ])
        .is_ok());
    }

    #[test]
    fn cli_args_when_pay_missing_fee_then_rejected() {
        assert!(
            CliArgs::try_parse_from(["bwtr", "-c", "cfg.yaml", "pay", "lnbcrt1example"]).is_err()
        );
    }
}

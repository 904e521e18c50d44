// mioty-at -- command-line access to a MIOTY modem behind a TCP serial bridge.
//
// Usage:
//   mioty-at --address 192.168.1.20:4001 info
//   mioty-at --config modem.yaml tx-power --set 14
//   mioty-at send 01020304
//   RUST_LOG=mioty_at_client=trace mioty-at send-bidi CAFE

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use mioty_at_client::{ClientConfig, ConfigError, MiotyClient};
use mioty_at_protocol::ProtocolError;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Talk to a MIOTY modem over its AT interface.
#[derive(Parser, Debug)]
#[command(name = "mioty-at", version, about)]
struct Cli {
    /// YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial bridge address (host:port), overrides the config file.
    #[arg(short, long)]
    address: Option<String>,

    /// Read timeout in milliseconds, overrides the config file.
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print end-point information.
    Info,
    /// Print the core library version.
    LibVersion,
    /// Print the EUI-64.
    Eui,
    /// Print the uplink packet counter.
    PacketCounter,
    /// Print or set the transmit power level.
    TxPower {
        /// New level (10..=100).
        #[arg(long)]
        set: Option<u32>,
    },
    /// Attach locally.
    AttachLocal,
    /// Detach locally.
    DetachLocal,
    /// Print whether the end-point is attached.
    Attachment,
    /// Send a unidirectional uplink.
    Send {
        /// Payload as hex.
        payload: String,
    },
    /// Send a bidirectional uplink and print the downlink.
    SendBidi {
        /// Payload as hex.
        payload: String,
    },
    /// Soft-reset the modem.
    Reset,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid hex payload: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            if let CliError::Protocol(ref p) = e {
                let code = p.return_code();
                let layer = if code.is_at_layer() { "AT" } else { "MAC" };
                error!("{} layer return code {}", layer, code);
            }
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(address) = &cli.address {
        config.address = address.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.read_timeout_ms = timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let address = config.address.clone();
    let mut client =
        MiotyClient::connect(config).map_err(|source| CliError::Connect { address, source })?;

    match cli.command {
        Command::Info => println!("{}", client.ep_info()?),
        Command::LibVersion => println!("{}", client.core_lib_info()?),
        Command::Eui => println!("{}", hex::encode_upper(client.eui()?)),
        Command::PacketCounter => println!("{}", client.packet_counter()?),
        Command::TxPower { set: Some(level) } => {
            client.set_transmit_power(level)?;
            info!("transmit power set to {}", level);
        }
        Command::TxPower { set: None } => println!("{}", client.transmit_power()?),
        Command::AttachLocal => println!("mac state {}", client.mac_attach_local()?),
        Command::DetachLocal => println!("mac state {}", client.mac_detach_local()?),
        Command::Attachment => println!("{}", client.attachment()?),
        Command::Send { payload } => {
            let data = hex::decode(payload)?;
            let packet_counter = client.send_uni(&data)?;
            println!("packet counter {}", packet_counter);
        }
        Command::SendBidi { payload } => {
            let data = hex::decode(payload)?;
            let downlink = client.send_bidi(&data)?;
            println!("packet counter {}", downlink.packet_counter);
            println!("mpf {:02X}", downlink.mpf);
            println!("downlink {}", hex::encode_upper(&downlink.data));
        }
        Command::Reset => {
            client.reset()?;
            info!("reset sent");
        }
    }

    info!(
        "{} commands sent, {} failed",
        client.commands_sent(),
        client.commands_failed()
    );
    Ok(())
}

//! `blebridge` command line.

use std::path::PathBuf;
use std::process::ExitCode;

use blebridge_host::{BleHost, TcpLink};
use blebridge_protocol::Parameter;
use blebridge_runner::{init_tracing, run_demo, BridgeServer, RunnerConfig, RunnerResult};
use clap::{Parser, Subcommand};
use tracing::error;

/// Host <-> BLE module bridge
#[derive(Parser)]
#[command(name = "blebridge")]
#[command(about = "Simulate and drive an AT-style BLE module over a serial link")]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (overrides RUST_LOG), e.g. "debug" or "blebridge_module=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated module behind a TCP port
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(short, long)]
        listen: Option<String>,
    },
    /// Send text to the remote app through a bridge
    Send {
        /// Bridge address
        #[arg(long)]
        connect: String,
        /// Text to send
        text: String,
    },
    /// Read or change the advertised name
    Name {
        /// Bridge address
        #[arg(long)]
        connect: String,
        /// New name (up to 16 bytes)
        name: Option<String>,
    },
    /// Print the module version
    Version {
        /// Bridge address
        #[arg(long)]
        connect: String,
    },
    /// Query a module parameter
    Get {
        /// Bridge address
        #[arg(long)]
        connect: String,
        /// Parameter token, e.g. NAME or CONNECTED
        param: Parameter,
    },
    /// Run host, module and phone in one process
    Demo {
        /// Text to send
        #[arg(default_value = "TEXT=BTN:gain:12dB")]
        text: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> RunnerResult<()> {
    let mut config = RunnerConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { listen } => {
            if let Some(listen) = listen {
                config.listen = listen;
            }
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(async {
                let server = BridgeServer::bind(&config).await?;
                server.run().await
            })
        }
        Commands::Send { connect, text } => {
            let mut host = BleHost::new(TcpLink::connect(connect.as_str())?, config.host);
            let report = host.send_message(text.as_bytes())?;
            println!(
                "sent {} of {} bytes in {} fragments{}",
                report.bytes_acked,
                report.padded_len,
                report.fragments,
                if report.padded { " (padded)" } else { "" }
            );
            Ok(())
        }
        Commands::Name { connect, name } => {
            let mut host = BleHost::new(TcpLink::connect(connect.as_str())?, config.host);
            if let Some(name) = name {
                host.set_name(&name)?;
            }
            println!("{}", host.get_name()?);
            Ok(())
        }
        Commands::Version { connect } => {
            let mut host = BleHost::new(TcpLink::connect(connect.as_str())?, config.host);
            println!("{}", host.version()?);
            Ok(())
        }
        Commands::Get { connect, param } => {
            let mut host = BleHost::new(TcpLink::connect(connect.as_str())?, config.host);
            let reply = host.get(param)?;
            println!("{}", String::from_utf8_lossy(&reply.encode()).trim_end());
            Ok(())
        }
        Commands::Demo { text } => {
            let demo = run_demo(&text, &config)?;
            for (i, notification) in demo.notifications.iter().enumerate() {
                let label = if i == 0 { "header".to_string() } else { format!("frag {}", i - 1) };
                println!("{:>8}: {}", label, hex::encode(notification));
            }
            match demo.message {
                Some(message) => println!("received: {}", String::from_utf8_lossy(&message)),
                None => println!("nothing received"),
            }
            println!(
                "acked {} of {} bytes",
                demo.report.bytes_acked, demo.report.padded_len
            );
            Ok(())
        }
    }
}

#![warn(clippy::all)]

use clap::{crate_version, Parser};
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

use std::fs::File;
use std::io;
use std::net::IpAddr;
use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use libpcap_relay::{
    Classifier, Config, Error, Output, OutputSink, Relay, UdpFrameSource, DEFAULT_SNAPLEN,
};

/// Receive capture records over UDP and write them as a pcap stream
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<String>,

    /// The UDP port to listen
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to listen on (default: 0.0.0.0)
    #[arg(short, long)]
    bind: Option<IpAddr>,

    /// Write the pcap stream to this file instead of stdout ("-" for stdout)
    #[arg(short, long, value_name = "FILE")]
    write: Option<String>,

    /// Snaplen declared when the pcap header has to be generated
    #[arg(long)]
    snaplen: Option<u32>,

    /// Enable verbose log to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(config: &mut Config, filename: &str) -> Result<(), Error> {
    let path = Path::new(&filename);
    let file = File::open(path)?;
    config.load_config(file)
}

/// Merge command-line arguments over the configuration file values
fn build_config(args: &Args) -> Result<Config, Error> {
    let mut config = Config::default();
    if let Some(filename) = args.config.as_ref() {
        load_config(&mut config, filename)?;
    }
    if let Some(port) = args.port {
        config.set("port", i64::from(port));
    }
    if let Some(addr) = args.bind {
        config.set("bind", addr.to_string());
    }
    if let Some(output) = args.write.as_ref() {
        config.set("output", output.as_str());
    }
    if let Some(snaplen) = args.snaplen {
        config.set("snaplen", i64::from(snaplen));
    }
    if args.verbose {
        config.set("verbose", true);
    }
    Ok(config)
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let env_filter = EnvFilter::try_from_env("PCAP_UDP_RECEIVER_LOG")
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    // stdout carries the pcap stream
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .compact()
        .init();
}

fn run(config: &Config) -> Result<(), Error> {
    let port = match config.get_usize("port") {
        Some(port) => u16::try_from(port).map_err(|_| Error::Config(format!("invalid port {port}")))?,
        None => return Err(Error::Config("no UDP port to listen".to_owned())),
    };
    let bind: IpAddr = config
        .get("bind")
        .unwrap_or("0.0.0.0")
        .parse()
        .map_err(|_| Error::Config("invalid bind address".to_owned()))?;
    let snaplen = match config.get_usize("snaplen") {
        Some(n) => u32::try_from(n).map_err(|_| Error::Config(format!("invalid snaplen {n}")))?,
        None => DEFAULT_SNAPLEN,
    };
    let poll_interval = match config.get_usize("poll_interval_ms") {
        Some(0) => return Err(Error::Config("poll_interval_ms must not be zero".to_owned())),
        Some(ms) => ms as u64,
        None => 500,
    };
    let output = Output::from_name(config.get("output").unwrap_or("-"));

    let source = UdpFrameSource::bind((bind, port), Some(Duration::from_millis(poll_interval)))?;
    info!("Listening on UDP {}", source.local_addr()?);
    let sink = OutputSink::new(output.open()?);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|_| Error::Generic("Could not set interrupt handler"))?;

    let mut relay = Relay::new(source, sink, Classifier::with_snaplen(snaplen));
    relay.run(running)?;
    debug!("Closing output");
    Ok(())
}

fn main() {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("pcap-udp-receiver: {e}");
            process::exit(1);
        }
    };
    init_logging(config.get_bool("verbose").unwrap_or(false));
    debug!("pcap-udp-receiver {}", crate_version!());

    if let Err(e) = run(&config) {
        error!("{e}");
        process::exit(1);
    }
    info!("pcap-udp-receiver: done, exiting");
}

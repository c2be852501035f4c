use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use log::*;
use tokio::net::UnixListener;
use tokio::sync::mpsc;

mod app;
mod port;
mod uart;

use port::SimPort;
use uart::{SimSerial, UartSim};

const SOCKET_PATH: &str = "/tmp/xserial.sock";
const DEFAULT_BAUD_RATE: &str = "115200";

#[derive(Parser, Debug)]
#[command(name = "uart-sim")]
#[command(about = "Simulated UART board running the xserial demo program", long_about = None)]
#[command(version)]
struct Args {
    /// Unix socket the terminal connects to
    #[arg(default_value = SOCKET_PATH)]
    socket: PathBuf,

    /// Line rate in bits per second (8N1 framing)
    #[arg(default_value = DEFAULT_BAUD_RATE, value_parser = clap::value_parser!(u32).range(1..))]
    baud: u32,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Args { socket: path, baud } = Args::parse();

    if path.exists() {
        let _ = std::fs::remove_file(&path);
    }
    let listener = UnixListener::bind(&path).expect("Failed to bind Unix Socket");
    info!("UART simulator listening on {:?} at {} baud", path, baud);

    let (stream, _) = listener.accept().await.expect("Failed to accept");
    info!("Terminal attached");

    let (wire_tx, wire_rx) = mpsc::unbounded_channel();
    let serial: Arc<SimSerial> = Arc::new(SimSerial::new(SimPort::new(wire_tx)));
    serial.initialize();

    let shutdown = Arc::new(AtomicBool::new(false));
    let sim = UartSim::new(serial.clone(), baud, shutdown.clone());
    let stats = sim.stats();
    let line = tokio::spawn(sim.run(stream, wire_rx));

    let foreground = {
        let serial = serial.clone();
        let shutdown = shutdown.clone();
        tokio::task::spawn_blocking(move || app::run(&*serial, &shutdown))
    };

    line.await.expect("line task panicked");
    shutdown.store(true, Ordering::Release);
    match foreground.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Application error: {}", e),
        Err(e) => error!("Application panicked: {}", e),
    }

    info!("=== Line Closed ===");
    info!("Bytes sent: {}", serial.port().sent());
    info!("Bytes received: {}", stats.received.load(Ordering::Relaxed));
    info!("Bytes ignored (rx disabled): {}", stats.ignored.load(Ordering::Relaxed));
    let _ = std::fs::remove_file(&path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["uart-sim"]).unwrap();
        assert_eq!(args.socket, PathBuf::from(SOCKET_PATH));
        assert_eq!(args.baud, 115_200);
    }

    #[test]
    fn test_args_positional() {
        let args = Args::try_parse_from(["uart-sim", "/tmp/com1.sock", "9600"]).unwrap();
        assert_eq!(args.socket, PathBuf::from("/tmp/com1.sock"));
        assert_eq!(args.baud, 9600);
    }

    #[test]
    fn test_args_rejects_bad_baud() {
        for baud in ["0", "115k", "-1"] {
            let err = Args::try_parse_from(["uart-sim", "/tmp/com1.sock", baud]).unwrap_err();
            assert_ne!(err.kind(), ErrorKind::DisplayHelp, "baud {baud:?}");
        }
    }

    #[test]
    fn test_args_help() {
        let err = Args::try_parse_from(["uart-sim", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}

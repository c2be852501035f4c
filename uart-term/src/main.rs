use std::path::PathBuf;

use clap::Parser;
use log::*;
use tokio::io;
use tokio::net::UnixStream;

const SOCKET_PATH: &str = "/tmp/xserial.sock";

#[derive(Parser, Debug)]
#[command(name = "uart-term")]
#[command(about = "Terminal for a running uart-sim", long_about = None)]
#[command(version)]
struct Args {
    /// Unix socket uart-sim is listening on
    #[arg(default_value = SOCKET_PATH)]
    socket: PathBuf,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = Args::parse().socket;

    info!("Connecting to {:?}...", path);
    let stream = UnixStream::connect(&path).await.expect("Failed to connect Unix Socket");
    info!("Connected!");

    let (mut line_in, mut line_out) = stream.into_split();

    let keyboard = tokio::spawn(async move {
        let mut stdin = io::stdin();
        match io::copy(&mut stdin, &mut line_out).await {
            Ok(n) => debug!("stdin closed after {} bytes", n),
            Err(e) => error!("Write to line failed: {}", e),
        }
    });

    let mut stdout = io::stdout();
    match io::copy(&mut line_in, &mut stdout).await {
        Ok(n) => info!("Line closed, {} bytes received", n),
        Err(e) => error!("Read from line failed: {}", e),
    }
    keyboard.abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        assert_eq!(Args::try_parse_from(["uart-term"]).unwrap().socket, PathBuf::from(SOCKET_PATH));
        let args = Args::try_parse_from(["uart-term", "/tmp/com1.sock"]).unwrap();
        assert_eq!(args.socket, PathBuf::from("/tmp/com1.sock"));
        assert!(Args::try_parse_from(["uart-term", "a", "b"]).is_err());
    }
}

//! `msghub client`: Interactive peer reading stdin.

use msghub_hub::Client;
use msghub_types::{codec, ClientConfig, Id, Message, SEPARATOR};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Turn an input line into a message: words become fields, the first one is
/// the destination.
pub fn parse_line(line: &str) -> Message {
    let raw = line.replace(' ', &char::from(SEPARATOR).to_string());
    let (to, data) = codec::decode(raw.as_bytes());
    Message {
        from: Id::empty(),
        to,
        data,
    }
}

pub async fn run(config: ClientConfig) {
    let client = Client::new(config).on_message(|msg| {
        println!("{} {:?}", msg.from, msg.data);
    });

    let input = client.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if input.send(parse_line(&line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    eprintln!("reading standard input: {e}");
                    break;
                }
            }
        }
    });

    let mut backoff = INITIAL_BACKOFF;
    loop {
        info!(url = %client.config().url, "try to connect");
        match client.dial().await {
            Ok(()) => backoff = INITIAL_BACKOFF,
            Err(e) => {
                warn!(error = %e, "connect failed, retrying in {backoff:?}");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_splits_words() {
        let msg = parse_line("7 hello world");
        assert_eq!(msg.to, "7");
        assert_eq!(msg.data, vec!["hello", "world"]);
        assert!(msg.from.is_empty());
    }

    #[test]
    fn test_parse_line_bare_destination() {
        let msg = parse_line("@whoami");
        assert_eq!(msg.to, "@whoami");
        assert!(msg.data.is_empty());
    }
}

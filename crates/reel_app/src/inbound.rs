use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

use reel_core::Msg;
use reel_engine::decode_event;
use reel_logging::{reel_info, reel_warn};

/// Feeds backend notifications, one JSON envelope per line, into the
/// dispatcher. When the input ends the application quits.
pub(crate) fn spawn_reader<R>(reader: R, msg_tx: mpsc::Sender<Msg>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        let forwarded = pump(reader, &msg_tx);
        reel_info!("event input closed after {} events", forwarded);
        let _ = msg_tx.send(Msg::QuitClicked);
    })
}

/// Returns the number of messages forwarded. Lines that do not decode are
/// logged and skipped.
pub(crate) fn pump<R: BufRead>(reader: R, msg_tx: &mpsc::Sender<Msg>) -> usize {
    let mut forwarded = 0;
    for (index, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                reel_warn!("reading event input failed: {}", err);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match decode_event(&line) {
            Ok(msg) => {
                if msg_tx.send(msg).is_err() {
                    break;
                }
                forwarded += 1;
            }
            Err(err) => reel_warn!("event on line {} skipped: {}", index + 1, err),
        }
    }
    forwarded
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use headlink_frame::{CommandId, FrameError, Response, Status};
use headlink_peer::{HeadListener, LinkConfig, PeerError, TcpHeadLink};

use crate::cmd::ServeArgs;
use crate::exit::{peer_error, CliError, CliResult, SUCCESS};
use crate::output::{print_served, OutputFormat, Served};

/// How often Ctrl-C is checked while waiting for or reading from a controller.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

enum RecvErrorDisposition {
    Continue,
    Break,
    Fatal(CliError),
}

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let listener = HeadListener::bind(args.addr.as_str())
        .map_err(|err| peer_error("bind failed", err))?
        .with_config(LinkConfig::default().with_read_timeout(Some(POLL_INTERVAL)));
    tracing::info!(addr = %listener.local_addr(), "head listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let status = Status::from(args.status);
    let mut answered = 0usize;

    while running.load(Ordering::SeqCst) {
        let accepted = listener
            .try_accept()
            .map_err(|err| peer_error("accept failed", err))?;
        let Some(mut link) = accepted else {
            thread::sleep(POLL_INTERVAL);
            continue;
        };

        while running.load(Ordering::SeqCst) {
            let request = match link.next_request() {
                Ok(request) => request,
                Err(err) => match classify_recv_error(err) {
                    RecvErrorDisposition::Continue => continue,
                    RecvErrorDisposition::Break => break,
                    RecvErrorDisposition::Fatal(cli_err) => return Err(cli_err),
                },
            };

            let command = request.command_id();
            if let Err(err) = link.write_response(Response::new(command, status)) {
                tracing::warn!(error = %err, "failed answering controller");
                break;
            }
            report(&link, command, status, format);

            answered += 1;
            if args.count.is_some_and(|count| answered >= count) {
                return Ok(SUCCESS);
            }
        }

        if link.dropped_bytes() > 0 {
            tracing::info!(dropped = link.dropped_bytes(), "link closed after resyncing");
        }
    }

    Ok(SUCCESS)
}

fn report(link: &TcpHeadLink, command: CommandId, status: Status, format: OutputFormat) {
    let served = Served {
        peer: link.peer_addr(),
        command,
        status,
        stabilized: link.stabilization().is_enabled(),
        configuration: link.requested_configuration(),
    };
    print_served(&served, format);
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

fn classify_recv_error(err: PeerError) -> RecvErrorDisposition {
    match err {
        PeerError::Timeout(_) => RecvErrorDisposition::Continue,
        PeerError::Disconnected(reason) => {
            tracing::info!(%reason, "controller disconnected");
            RecvErrorDisposition::Break
        }
        PeerError::Sequencing { .. } | PeerError::Frame(FrameError::Io(_)) => {
            tracing::warn!(error = %err, "dropping controller");
            RecvErrorDisposition::Break
        }
        // A checksummed packet with an out-of-domain field: nothing to answer.
        PeerError::Frame(frame_err) => {
            tracing::warn!(error = %frame_err, "ignoring undecodable request");
            RecvErrorDisposition::Continue
        }
        other => RecvErrorDisposition::Fatal(peer_error("receive failed", other)),
    }
}

#[cfg(test)]
mod tests {
    use headlink_frame::MessageKind;

    use super::*;

    #[test]
    fn idle_reads_keep_the_link() {
        let disposition = classify_recv_error(PeerError::Timeout(POLL_INTERVAL));
        assert!(matches!(disposition, RecvErrorDisposition::Continue));
    }

    #[test]
    fn disconnect_and_sequencing_drop_the_link() {
        let disposition = classify_recv_error(PeerError::Disconnected("closed".to_string()));
        assert!(matches!(disposition, RecvErrorDisposition::Break));

        let disposition = classify_recv_error(PeerError::Sequencing {
            expected: MessageKind::Request,
            actual: MessageKind::Response,
            command_id: CommandId::Stop,
        });
        assert!(matches!(disposition, RecvErrorDisposition::Break));
    }

    #[test]
    fn bad_field_is_skipped() {
        let disposition = classify_recv_error(PeerError::Frame(FrameError::InvalidField {
            field: "rate",
            value: 9,
        }));
        assert!(matches!(disposition, RecvErrorDisposition::Continue));
    }

    #[test]
    fn io_failure_drops_the_link() {
        let disposition = classify_recv_error(PeerError::Frame(FrameError::Io(
            std::io::Error::from(std::io::ErrorKind::ConnectionReset),
        )));
        assert!(matches!(disposition, RecvErrorDisposition::Break));
    }

    #[test]
    fn transport_failure_is_fatal() {
        let disposition = classify_recv_error(PeerError::Transport(
            headlink_transport::TransportError::Io(std::io::Error::from(
                std::io::ErrorKind::PermissionDenied,
            )),
        ));
        assert!(matches!(disposition, RecvErrorDisposition::Fatal(_)));
    }
}

//! Minimal head emulator: accepts one controller and acknowledges every
//! request until it disconnects.
//!
//! Run with:
//!   cargo run --example head-emulator -- 127.0.0.1:7700
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1:7700 angles-rel --yaw 30

use headlink::frame::{Response, Status};
use headlink::peer::{HeadListener, PeerError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7700".to_string());

    let listener = HeadListener::bind(addr.as_str())?;
    eprintln!("Listening on {}", listener.local_addr());

    let mut link = listener.accept()?;
    eprintln!("Controller connected: {:?}", link.peer_addr());

    loop {
        match link.read_request() {
            Ok(command) => {
                link.write_response(Response::new(command, Status::Ok))?;
                let config = link.requested_configuration();
                eprintln!(
                    "{command}: mode={} rpy=({:.3}, {:.3}, {:.3}) stabilized={}",
                    config.control_mode,
                    config.rpy.roll,
                    config.rpy.pitch,
                    config.rpy.yaw,
                    link.stabilization().is_enabled()
                );
            }
            // Default links time out after ten idle seconds; keep waiting.
            Err(PeerError::Timeout(_)) => continue,
            Err(e) => {
                eprintln!("Controller gone: {e}");
                break;
            }
        }
    }

    eprintln!("Dropped {} bytes while resyncing", link.dropped_bytes());
    Ok(())
}

//! Sweep the head's yaw back and forth in relative mode.
//!
//! Run against a head (or the head-emulator example) with:
//!   cargo run --example pan-sweep -- 127.0.0.1:7700

use std::time::Duration;

use headlink::frame::{Request, Rpy, StabilizationAxes, Status};
use headlink::peer::{connect_with_config, LinkConfig};

const STEP_DEGREES: f64 = 15.0;
const LIMIT_DEGREES: f64 = 90.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7700".to_string());

    let config = LinkConfig::default().with_response_timeout(Duration::from_secs(2));
    let mut client = connect_with_config(addr.as_str(), &config)?;

    let status = client.request(&Request::EnableStabilization(StabilizationAxes::all(false)))?;
    eprintln!("stabilization off: {status}");

    let mut yaw = -LIMIT_DEGREES;
    while yaw <= LIMIT_DEGREES {
        let pose = Rpy::new(0.0, 0.0, yaw.to_radians());
        let status = client.request(&Request::AnglesRelative(pose))?;
        eprintln!("yaw {yaw:>6.1} deg: {status}");
        if status == Status::Timeout {
            break;
        }
        yaw += STEP_DEGREES;
    }

    let status = client.request(&Request::Stop)?;
    eprintln!("stop: {status}");
    Ok(())
}

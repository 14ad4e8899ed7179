//! OSC receiver for per-joint motion samples.
//!
//! Motion senders transmit two message types over UDP, both with the
//! argument shape `(i32 frameId, i32 jointId, f32, f32, f32)`:
//! - `/translation` — the floats are a position in model units
//! - `/orientation` — the floats are per-axis Euler angles in degrees,
//!   applied in Z-X-Y rotation order
//!
//! Samples are handed to the avatar as they arrive; there is no buffering
//! or reordering. Messages that do not fit the shape are dropped without a
//! diagnostic — motion streams are best-effort and must never stall the
//! receive loop.

use rosc::{OscMessage, OscPacket, OscType};
use std::net::UdpSocket;
use std::sync::Arc;

use crate::avatar::Avatar;
use crate::config::OscConfig;
use crate::error::{OscPuppetError, StreamError};

/// Address of translation samples.
pub const TRANSLATION_ADDR: &str = "/translation";
/// Address of orientation samples.
pub const ORIENTATION_ADDR: &str = "/orientation";

/// OSC/UDP motion receiver feeding one avatar.
pub struct MotionReceiver {
    avatar: Arc<Avatar>,
    socket: Option<UdpSocket>,
    port: u16,
}

impl MotionReceiver {
    /// Create a new receiver. The socket is opened by [`start`].
    ///
    /// [`start`]: MotionReceiver::start
    pub fn new(config: &OscConfig, avatar: Arc<Avatar>) -> Self {
        Self {
            avatar,
            socket: None,
            port: config.port,
        }
    }

    /// Bind the UDP socket and start accepting packets.
    pub fn start(&mut self) -> Result<(), OscPuppetError> {
        let addr = format!("0.0.0.0:{}", self.port);

        let socket = UdpSocket::bind(&addr)
            .map_err(|e| StreamError::Bind(format!("{}: {}", addr, e)))?;

        // Non-blocking so the poll loop can interleave with shutdown
        socket
            .set_nonblocking(true)
            .map_err(|e| StreamError::Bind(format!("set_nonblocking: {}", e)))?;

        tracing::info!("Motion receiver listening on {}", addr);
        self.socket = Some(socket);

        Ok(())
    }

    /// Drain all pending packets (non-blocking).
    pub fn process(&self) -> Result<(), OscPuppetError> {
        let socket = match &self.socket {
            Some(s) => s,
            None => return Ok(()),
        };

        let mut buf = [0u8; 65536];

        loop {
            match socket.recv(&mut buf) {
                Ok(size) if size > 0 => {
                    if let Ok((_, packet)) = rosc::decoder::decode_udp(&buf[..size]) {
                        self.handle_packet(packet);
                    }
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    return Err(StreamError::Receive(e.to_string()).into());
                }
            }
        }

        Ok(())
    }

    fn handle_packet(&self, packet: OscPacket) {
        match packet {
            OscPacket::Message(msg) => self.handle_message(msg),
            OscPacket::Bundle(bundle) => {
                for packet in bundle.content {
                    self.handle_packet(packet);
                }
            }
        }
    }

    fn handle_message(&self, msg: OscMessage) {
        match msg.addr.as_str() {
            TRANSLATION_ADDR => {
                if let Some((frame, joint, values)) = decode_sample_args(&msg.args) {
                    self.avatar.set_position(frame, joint, values);
                }
            }
            ORIENTATION_ADDR => {
                if let Some((frame, joint, values)) = decode_sample_args(&msg.args) {
                    self.avatar.set_orientation(frame, joint, values);
                }
            }
            _ => {
                tracing::trace!("Unknown OSC message: {}", msg.addr);
            }
        }
    }

    /// Close the socket.
    pub fn stop(&mut self) {
        self.socket = None;
        tracing::info!("Motion receiver stopped");
    }
}

/// Extract `(frameId, jointId, [f32; 3])` from an argument list, or `None`
/// if the message does not fit the sample shape.
fn decode_sample_args(args: &[OscType]) -> Option<(i32, i32, [f32; 3])> {
    if args.len() < 5 {
        return None;
    }

    let frame = int_arg(&args[0])?;
    let joint = int_arg(&args[1])?;
    let x = float_arg(&args[2])?;
    let y = float_arg(&args[3])?;
    let z = float_arg(&args[4])?;

    Some((frame, joint, [x, y, z]))
}

fn int_arg(arg: &OscType) -> Option<i32> {
    match arg {
        OscType::Int(i) => Some(*i),
        OscType::Long(l) => i32::try_from(*l).ok(),
        _ => None,
    }
}

fn float_arg(arg: &OscType) -> Option<f32> {
    match arg {
        OscType::Float(f) => Some(*f),
        OscType::Double(d) => Some(*d as f32),
        OscType::Int(i) => Some(*i as f32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::test_scene;
    use glam::{Quat, Vec3};

    fn receiver() -> MotionReceiver {
        let avatar = Avatar::from_scene(test_scene(&[
            ("Armature", None),
            ("Hip", Some(0)),
            ("Head", Some(1)),
        ]));
        MotionReceiver::new(&OscConfig::default(), Arc::new(avatar))
    }

    fn sample_msg(addr: &str, frame: i32, joint: i32, v: [f32; 3]) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args: vec![
                OscType::Int(frame),
                OscType::Int(joint),
                OscType::Float(v[0]),
                OscType::Float(v[1]),
                OscType::Float(v[2]),
            ],
        }
    }

    #[test]
    fn test_translation_message_moves_joint() {
        let rx = receiver();
        rx.handle_message(sample_msg(TRANSLATION_ADDR, 7, 0, [1.0, 2.0, 3.0]));
        assert_eq!(rx.avatar.scene().node_position(1), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_orientation_message_rotates_joint() {
        let rx = receiver();
        rx.handle_message(sample_msg(ORIENTATION_ADDR, 7, 0, [0.0, 0.0, 90.0]));

        let q = rx.avatar.scene().node_orientation(1);
        assert!(q.dot(Quat::from_rotation_z(90f32.to_radians())).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn test_unknown_address_is_ignored() {
        let rx = receiver();
        rx.handle_message(sample_msg("/something/else", 7, 0, [1.0, 1.0, 1.0]));
        assert_eq!(rx.avatar.scene().node_position(1), Vec3::ZERO);
    }

    #[test]
    fn test_bundles_are_recursed() {
        let rx = receiver();
        let bundle = OscPacket::Bundle(rosc::OscBundle {
            timetag: rosc::OscTime {
                seconds: 0,
                fractional: 0,
            },
            content: vec![
                OscPacket::Message(sample_msg(TRANSLATION_ADDR, 1, 0, [4.0, 0.0, 0.0])),
                OscPacket::Message(sample_msg(ORIENTATION_ADDR, 1, 0, [0.0, 90.0, 0.0])),
            ],
        });
        rx.handle_packet(bundle);

        assert_eq!(rx.avatar.scene().node_position(1), Vec3::new(4.0, 0.0, 0.0));
        let q = rx.avatar.scene().node_orientation(1);
        assert!(q.dot(Quat::from_rotation_y(90f32.to_radians())).abs() > 1.0 - 1e-5);
    }

    #[test]
    fn test_malformed_args_are_dropped() {
        let rx = receiver();

        // Too few args
        rx.handle_message(OscMessage {
            addr: TRANSLATION_ADDR.to_string(),
            args: vec![OscType::Int(1), OscType::Int(0)],
        });
        // Wrong types in the int slots
        rx.handle_message(OscMessage {
            addr: TRANSLATION_ADDR.to_string(),
            args: vec![
                OscType::String("frame".into()),
                OscType::Int(0),
                OscType::Float(1.0),
                OscType::Float(1.0),
                OscType::Float(1.0),
            ],
        });

        assert_eq!(rx.avatar.scene().node_position(1), Vec3::ZERO);
    }

    #[test]
    fn test_numeric_coercion() {
        let args = vec![
            OscType::Int(3),
            OscType::Int(0),
            OscType::Double(1.5),
            OscType::Int(2),
            OscType::Float(3.0),
        ];
        assert_eq!(decode_sample_args(&args), Some((3, 0, [1.5, 2.0, 3.0])));
    }

    #[test]
    fn test_process_without_start_is_noop() {
        let rx = receiver();
        rx.process().unwrap();
    }
}

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use rosc::{OscMessage, OscPacket, OscType};

use super::{Transport, TransportError, TransportResult};

/// Sends OSC messages over UDP to a single target.
pub struct OscTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl OscTransport {
    /// Bind an ephemeral local socket that sends to `target` (e.g. "127.0.0.1:57120").
    pub fn connect(target: &str) -> TransportResult<Self> {
        let target = target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| TransportError::Unresolved(target.to_string()))?;
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        log::info!(target: "osc", "sending to {}", target);
        Ok(Self { socket, target })
    }

}

/// Encode a message as a single OSC packet.
pub(crate) fn encode_message(addr: &str, args: Vec<i32>) -> TransportResult<Vec<u8>> {
    let packet = OscPacket::Message(OscMessage {
        addr: addr.to_string(),
        args: args.into_iter().map(OscType::Int).collect(),
    });
    rosc::encoder::encode(&packet).map_err(|e| TransportError::Encode(e.to_string()))
}

impl Transport for OscTransport {
    fn send_raw(&self, addr: &str, args: Vec<i32>) -> TransportResult {
        log::debug!(target: "osc", "-> {} {:?}", addr, args);
        let buf = encode_message(addr, args)?;
        self.socket.send_to(&buf, self.target)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn sends_decodable_packets_in_argument_order() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let addr = receiver.local_addr().unwrap().to_string();

        let transport = OscTransport::connect(&addr).unwrap();
        transport
            .send_raw("/chordOn", vec![64, 60])
            .unwrap();

        let mut buf = [0u8; 1024];
        let n = receiver.recv(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..n]).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/chordOn");
                assert_eq!(msg.args, vec![OscType::Int(64), OscType::Int(60)]);
            }
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[test]
    fn unresolvable_target_is_an_error() {
        assert!(OscTransport::connect("not an address").is_err());
    }
}

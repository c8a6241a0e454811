//! Video pull (§4.5): connect to the video port, decode a frame stream, and
//! hand the most recent frame to whoever's watching.
//!
//! The decoder itself is pluggable — the wire-level H.264 stream this port
//! carries is out of scope for the record-level parsing the rest of this crate
//! does, so callers supply a [`FrameDecoder`] the way the reference daemon lets
//! a `StreamHandler` own interpretation of its mjpeg payload (`stream.rs`).

use std::net::TcpStream;

/// An opaque decoded video frame. The payload format is whatever the injected
/// [`FrameDecoder`] produces; this crate does not interpret it further.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
}

/// Converts a connected video-port TCP stream into a sequence of frames.
///
/// Implementations own the stream once `open` is called and are expected to
/// block on reads internally, the same way [`crate::commander::Commander`]
/// blocks on its command socket.
pub trait FrameDecoder: Send {
    fn open(self: Box<Self>, stream: TcpStream) -> Box<dyn Iterator<Item = Frame> + Send>;
}

/// A decoder that immediately ends the frame stream. Useful for exercising the
/// Vision worker's connection and shutdown handling without a real H.264 feed.
pub struct NullDecoder;

impl FrameDecoder for NullDecoder {
    fn open(self: Box<Self>, _stream: TcpStream) -> Box<dyn Iterator<Item = Frame> + Send> {
        Box::new(std::iter::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn null_decoder_yields_no_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = std::thread::spawn(move || TcpStream::connect(addr).unwrap());
        let (server_side, _) = listener.accept().unwrap();
        let _client_side = client.join().unwrap();

        let mut frames = Box::new(NullDecoder).open(server_side);
        assert!(frames.next().is_none());
    }
}

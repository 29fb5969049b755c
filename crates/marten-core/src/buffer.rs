//! Opaque message payloads.
//!
//! All cross-context data exchange happens by moving serialized buffers.
//! `Buffer` is deliberately not `Clone`: handing one to the channel
//! transfers ownership, so the sender keeps no usable reference afterward.

use std::fmt;

/// An owned, serialized byte payload.
///
/// The registry treats the contents as fully opaque; producing and
/// consuming the serialized form is the job of the embedding engine's
/// serialization subsystem.
pub struct Buffer {
    bytes: Vec<u8>,
}

impl Buffer {
    /// Wrap an already-serialized payload.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the buffer, yielding the payload.
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_vec(bytes)
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_vec(bytes.to_vec())
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payloads are opaque; only the length is meaningful here.
        f.debug_struct("Buffer").field("len", &self.bytes.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_payload() {
        let buf = Buffer::from_vec(b"ping".to_vec());
        assert_eq!(buf.len(), 4);
        assert!(!buf.is_empty());
        assert_eq!(buf.as_slice(), b"ping");
        assert_eq!(buf.into_vec(), b"ping".to_vec());
    }

    #[test]
    fn debug_hides_contents() {
        let buf = Buffer::from(&b"secret"[..]);
        let rendered = format!("{:?}", buf);
        assert!(rendered.contains("len"));
        assert!(!rendered.contains("secret"));
    }
}

//! BLOB handles.
//!
//! A BLOB cell does not carry its contents. The engine hands back an opaque
//! handle and the contents are read with a second round trip
//! (`Engine::read_blob`). Handles are row-scoped: an engine may invalidate
//! them as soon as the cursor advances.

use std::fmt;

/// Opaque handle identifying a BLOB within the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobHandle(pub u64);

impl BlobHandle {
    /// Raw handle value.
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_handle_display() {
        assert_eq!(BlobHandle(0x2a).to_string(), "0x000000000000002a");
        assert_eq!(BlobHandle(7).id(), 7);
    }
}

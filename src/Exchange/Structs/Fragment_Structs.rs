// The unit of transfer between producer and consumer.

/// One encoded fragment plus where it goes back.
///
/// Built once by the producer and never mutated. `size` is derived from the
/// payload at construction time so it can not drift from it.
#[derive(Clone, PartialEq, Eq)]
pub struct FragmentInfo {
    payload: Vec<u8>,
    size: usize,
    offset: usize,
    index: usize,
}

impl FragmentInfo {
    pub fn new(index: usize, offset: usize, payload: Vec<u8>) -> Self {
        Self {
            size: payload.len(),
            payload,
            offset,
            index,
        }
    }

    /// Encoded bytes as produced by the codec.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Byte length recorded at construction.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Horizontal pixel offset inside the destination surface.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Position in production order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Recorded size matches the payload actually carried.
    pub fn is_consistent(&self) -> bool {
        self.size == self.payload.len()
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

impl std::fmt::Debug for FragmentInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_fragment_info(self, f)
    }
}

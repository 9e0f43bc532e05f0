use super::Channel::FragmentChannel;
use std::fmt;

impl fmt::Debug for FragmentChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_fragment_channel(self, f)
    }
}

mod builder;
mod consumer;
mod defragmenter;
mod fragmenter;
mod order;
mod producer;

pub use builder::{ChannelRun, ExchangeBuilder, HandoffMode, ObserverRun, DEFAULT_FRAGMENT_COUNT};
pub use consumer::{DrainReport, FragmentConsumer, PassOutcome, DEFAULT_IDLE_WAIT};
pub use defragmenter::{Defragmenter, HandoffForwarder};
pub use fragmenter::{Fragmenter, NotifyReport, Removal, Subscriber, SubscriberId};
pub use order::VisitOrder;
pub use producer::{FragmentProducer, ProduceReport};

pub mod Channel {
    pub mod Channel;
    pub mod Channel_impl;
    mod debug;
    pub use self::Channel::FragmentChannel; // re-export for stable path
}

pub mod Gate {
    pub mod ready_gate;
    pub mod rendezvous;
    pub use ready_gate::{ReadyGate, DEFAULT_HANDSHAKE_TIMEOUT};
    pub use rendezvous::{rendezvous, HandoffReceiver, HandoffSender};
}

pub mod Structs {
    pub mod Fragment_Structs;
    pub use Fragment_Structs::FragmentInfo; // re-export for stable path
}

pub use Channel::FragmentChannel;

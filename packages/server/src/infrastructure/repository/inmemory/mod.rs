pub mod signaling;

pub use signaling::InMemorySignalingRepository;

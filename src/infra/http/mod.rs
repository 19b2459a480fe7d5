pub mod envelope;
pub mod transport;

// Backend API boundary: error taxonomy and wire decoding.

pub mod errors;
pub mod wire;

pub use errors::ApiError;
pub use wire::{decode_item, ListEnvelope, TransitionRequest, WireItem};

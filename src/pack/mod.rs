pub mod delta;
pub mod header;
pub mod stream;

pub use stream::{decode, DecodedObject};

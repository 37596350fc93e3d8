mod encoder;
mod keys;
mod signer;

pub use encoder::JwsEncoder;
pub use signer::{JwsSigner, PemKeyStore};


pub mod algo;
pub mod fingerprint;

pub use algo::{digest_instance, digest_tour};
pub use fingerprint::{DigestError, InstanceDigest, TourDigest};

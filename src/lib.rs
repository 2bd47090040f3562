//! Decoder for instance and tour files in the TSPLIB text format.
//!
//! [`Instance::read`] turns a file into an immutable [`Instance`]; explicit edge weights
//! are normalised to a single compact layout on the way. [`EdgeWeightResolver`] then
//! supplies edge weights and tour values for every supported `EDGE_WEIGHT_TYPE`.
//!
//! [`Instance`]: instance::Instance
//! [`Instance::read`]: instance::Instance::read
//! [`EdgeWeightResolver`]: weights::EdgeWeightResolver

pub mod checks;
pub mod distance;
pub mod format;
pub mod instance;
pub mod io;
pub mod triangular;
pub mod weights;

#[cfg(feature = "with_digest")]
pub mod digest;

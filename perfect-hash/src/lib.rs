//! Perfect hash functions over byte strings.
//!
//! A [`Phf`] maps every key of a static set to a distinct integer of `[0, ng)` in constant time,
//! with no collisions and no stored keys. It is built with the CHD ("compress, hash, displace")
//! scheme: keys are split into small buckets by one hash, and each bucket gets a displacement
//! that moves its keys onto free slots under a second hash.
//!
//! ```
//! use perfect_hash::Phf;
//!
//! let keys = ["Je", "suis", "un", "ensemble", "de", "clés"];
//! let phf = Phf::build(&keys)?;
//! for (i, key) in keys.iter().enumerate() {
//!     assert_eq!(phf.evaluate(key), i);
//! }
//!
//! // Keys can also be sent to chosen values
//! let phf = Phf::build_with_values(&keys, &[9, 12, 15, 18, 21, 24])?;
//! assert_eq!(phf.evaluate("clés"), 24);
//! # Ok::<(), perfect_hash::BuildError>(())
//! ```
//!
//! Construction is randomized but deterministic: the same keys and [`BuildConfig`] always produce
//! the same function. The result can be persisted through [`RawParts`] or, with the `serde`
//! feature, any serde format.
//!
//! Progress of construction is reported through the [`log`] facade.

pub(crate) mod bitmap;
pub(crate) mod buckets;
mod builder;
mod codec;
mod error;
pub mod hash;
mod phf;
pub(crate) mod solver;

pub use builder::{BuildConfig, Builder};
pub use codec::RawParts;
pub use error::{BucketFailure, BuildError, DecodeError, InvalidInput};
pub use hash::Seed;
pub use phf::Phf;

#[cfg(test)]
mod tests;

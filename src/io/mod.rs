//! Binary codecs for the on-disk massif header and checkpoint envelope.

pub mod checkpoint;
pub mod start;

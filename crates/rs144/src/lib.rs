#![allow(rustdoc::broken_intra_doc_links)]
#![allow(clippy::needless_doctest_main)]
#![doc = include_str!("../readme.md")]
pub mod decode;
pub mod diag;
pub mod filter;

pub mod prelude {
    /// The root structure to decode packets
    pub use crate::decode::{Ax25Packet, DecodedInfo, Decoder, Digipeater};
    pub use crate::diag::{
        CaptureSink, DiagSink, LogSink, NullSink, Severity,
    };
    pub use crate::filter::{pfilter, Channel, FilterError};
}

//! WSR-88D (NEXRAD) data decoding.
//!
//! Supports:
//! - Archive II (Level II) volumes: LDM record framing, bzip2 records,
//!   segmented message reassembly and the elevation scan index
//! - Level II RDA messages: RDA status, VCP, clutter filter maps, digital radar data
//! - Level III products: WMO/CCB headings, description block, symbology,
//!   graphic and tabular alphanumeric blocks
//!
//! All multi-byte fields are big-endian. Malformed input never panics; it is
//! logged and surfaces as a [`DecodeError`] for the smallest enclosing unit.

pub mod ar2v;
pub mod codec;
pub mod error;
pub mod file_factory;
pub mod level2;
pub mod level3;

pub use ar2v::{Ar2vFile, ElevationScan, ElevationScanSelection, VolumeHeader};
pub use codec::{validate_message, FieldReader};
pub use error::{DecodeError, DecodeResult};
pub use file_factory::{load_file, NexradFile};
pub use level2::{DataBlockType, Level2Message, Level2MessageData, Level2MessageFactory};
pub use level3::{Level3File, Level3Message};

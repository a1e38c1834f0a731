//! Level III (RPG) product decoding.
//!
//! A product is an 18-byte [`Level3MessageHeader`], a
//! [`ProductDescriptionBlock`], then optional symbology, graphic and tabular
//! blocks located by halfword offsets in the description block.

pub mod description;
pub mod file;
pub mod header;
pub mod message;
pub mod packets;
pub mod status;
pub mod symbology;
pub mod tabular;
pub mod wmo;

pub use description::ProductDescriptionBlock;
pub use file::Level3File;
pub use header::Level3MessageHeader;
pub use message::{
    create_message, GraphicProductMessage, Level3Message, ProductKind, TabularProductMessage,
};
pub use packets::Packet;
pub use status::{GeneralStatusMessage, RadarCodedMessage};
pub use symbology::{GraphicAlphanumericBlock, ProductSymbologyBlock};
pub use tabular::TabularAlphanumericBlock;
pub use wmo::{CcbHeader, WmoHeader};

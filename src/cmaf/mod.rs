//! CMAF/fMP4 box writer and reader: `ftyp/moov/moof/mdat/styp` per
//! ISO/IEC 14496-12 and the CMAF profile brands.

pub mod boxes;
pub mod reader;
pub mod writer;

pub use boxes::Codec;
pub use reader::{parse_boxes, require_box, ParsedBox};
pub use writer::{write_init_segment, write_media_segment, SampleInfo, TrackConfig};

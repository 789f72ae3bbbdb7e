pub mod buffer;
pub mod codec;
pub mod codec_id;
pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use buffer::ChunkBuffer;
pub use codec::Codec;
pub use codec_id::CodecId;
pub use error::{CorruptDataError, EncodingError, UnknownCodecError};
pub use format::{ChunkEntry, FileHeader, DEFAULT_CHUNK_SIZE, HEADER_SIZE, MAGIC, MAX_CHUNK_SIZE};
pub use reader::{read_header, ChunkReader};
pub use writer::ChunkWriter;

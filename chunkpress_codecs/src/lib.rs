mod gzip_codec;
mod lz4_codec;
mod lz4_prefixed;
mod passthrough;
pub mod registry;
mod snappy_codec;
mod zstd_codec;

pub use gzip_codec::{GzipCodec, DEFAULT_GZIP_LEVEL};
pub use lz4_codec::Lz4Codec;
pub use lz4_prefixed::Lz4LengthPrefixedCodec;
pub use passthrough::PassThroughCodec;
pub use registry::{all_codecs, codec_by_id, codec_by_name, codec_by_raw_id};
pub use snappy_codec::SnappyCodec;
pub use zstd_codec::{ZstdCodec, DEFAULT_ZSTD_LEVEL};

//! Process-wide codec registry.
//!
//! Every identifier maps to one shared instance, created on first lookup and
//! kept for the life of the process. Instances hold only immutable settings,
//! so lookups and the codecs they return need no locking.

use std::sync::Arc;

use chunkpress_core::{Codec, CodecId, UnknownCodecError};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
    GzipCodec, Lz4Codec, Lz4LengthPrefixedCodec, PassThroughCodec, SnappyCodec, ZstdCodec,
};

fn init(codec: Arc<dyn Codec>) -> Arc<dyn Codec> {
    debug!(
        codec = codec.name(),
        id = codec.id().as_u16(),
        "codec initialized"
    );
    codec
}

static PASSTHROUGH: Lazy<Arc<dyn Codec>> = Lazy::new(|| init(Arc::new(PassThroughCodec)));
static SNAPPY: Lazy<Arc<dyn Codec>> = Lazy::new(|| init(Arc::new(SnappyCodec)));
static ZSTD: Lazy<Arc<dyn Codec>> = Lazy::new(|| init(Arc::new(ZstdCodec::default())));
static LZ4: Lazy<Arc<dyn Codec>> = Lazy::new(|| init(Arc::new(Lz4Codec)));
static LZ4_LENGTH_PREFIXED: Lazy<Arc<dyn Codec>> =
    Lazy::new(|| init(Arc::new(Lz4LengthPrefixedCodec)));
static GZIP: Lazy<Arc<dyn Codec>> = Lazy::new(|| init(Arc::new(GzipCodec::default())));

/// Resolve the shared codec instance for `id`.
///
/// Repeated calls return the same instance, so identical input always
/// compresses to identical bytes within a process.
pub fn codec_by_id(id: CodecId) -> Arc<dyn Codec> {
    let slot: &Lazy<Arc<dyn Codec>> = match id {
        CodecId::PassThrough => &PASSTHROUGH,
        CodecId::Snappy => &SNAPPY,
        CodecId::Zstd => &ZSTD,
        CodecId::Lz4 => &LZ4,
        CodecId::Lz4LengthPrefixed => &LZ4_LENGTH_PREFIXED,
        CodecId::Gzip => &GZIP,
    };
    Arc::clone(&**slot)
}

/// Resolve a codec from its on-disk `codec_id`.
///
/// Called when opening an existing chunk file, so the reader is initialized
/// with the codec recorded in its header.
pub fn codec_by_raw_id(raw: u16) -> Result<Arc<dyn Codec>, UnknownCodecError> {
    CodecId::try_from(raw).map(codec_by_id)
}

/// Resolve a codec from a user-facing name such as `"zstd"` or `"lz4"`.
pub fn codec_by_name(name: &str) -> Result<Arc<dyn Codec>, UnknownCodecError> {
    name.parse::<CodecId>().map(codec_by_id)
}

/// Every registered codec, in identifier order.
pub fn all_codecs() -> Vec<Arc<dyn Codec>> {
    CodecId::ALL.into_iter().map(codec_by_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_share_one_instance() {
        for id in CodecId::ALL {
            let first = codec_by_id(id);
            let second = codec_by_id(id);
            assert!(Arc::ptr_eq(&first, &second), "{id} should be a singleton");
            assert_eq!(first.id(), id);
        }
    }

    #[test]
    fn raw_ids_and_names_resolve() {
        assert_eq!(codec_by_raw_id(2).unwrap().name(), "zstd");
        assert_eq!(codec_by_name("gz").unwrap().id(), CodecId::Gzip);
        assert_eq!(
            codec_by_raw_id(99).err(),
            Some(UnknownCodecError::Id(99))
        );
        assert!(codec_by_name("lzo").is_err());
    }

    #[test]
    fn all_codecs_in_id_order() {
        let ids: Vec<u16> = all_codecs().iter().map(|c| c.id().as_u16()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    }
}

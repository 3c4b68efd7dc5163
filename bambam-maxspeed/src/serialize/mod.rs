mod deserializer;
mod header;
mod serializer;
mod varint;

pub use deserializer::load_maxspeeds;
pub use header::{SectionHeader, HEADER_SIZE, MAXSPEEDS_VERSION};
pub use serializer::{
    MaxspeedsSerializer, SerializeSummary, SerializerConfig,
    DEFAULT_BIDIRECTIONAL_WARNING_THRESHOLD,
};
pub use varint::{ReadVarint, WriteVarint};

mod maxspeed_converter;

pub use maxspeed_converter::{maxspeed_converter, MaxspeedConverter};

mod elias_fano;
mod maxspeeds;

pub use elias_fano::{EliasFanoBuilder, EliasFanoIter, EliasFanoView};
pub use maxspeeds::{Maxspeeds, MaxspeedsStats};

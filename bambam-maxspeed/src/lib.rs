//! compact storage of per-feature speed limits for road network map files.
//!
//! most features carry a single limit that applies in both directions. those
//! are stored as an Elias-Fano set of feature ids plus one speed macro byte
//! each. the rest, with a distinct backward limit, go to a small sorted
//! table. see [serialize] for the section layout and [store::Maxspeeds] for
//! lookups.
pub mod app;
pub mod codec;
pub mod error;
pub mod model;
pub mod serialize;
pub mod store;

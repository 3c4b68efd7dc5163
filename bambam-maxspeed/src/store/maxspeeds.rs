use serde::{Deserialize, Serialize};

use crate::{
    codec::maxspeed_converter,
    model::{FeatureMaxspeed, Maxspeed, SpeedMacro},
    store::EliasFanoView,
};

/// read-only speed limit lookup for every feature of one map file.
///
/// forward-only features, the vast majority, are kept as an Elias-Fano set of
/// feature ids plus one macro byte per id, both borrowed from the loaded
/// section bytes. the few bidirectional features are decoded into a sorted
/// vector. nothing here is written after construction, so a `Maxspeeds` may be
/// queried from any number of threads, and it cannot outlive the region it
/// was loaded from.
///
/// populated instances come from [`crate::serialize::load_maxspeeds`].
#[derive(Debug, Clone)]
pub struct Maxspeeds<'a> {
    forward_ids: EliasFanoView<'a>,
    forward_codes: &'a [u8],
    bidirectional: Vec<FeatureMaxspeed>,
}

/// entry counts of a loaded [Maxspeeds].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxspeedsStats {
    pub forward_only_count: usize,
    pub bidirectional_count: usize,
    pub forward_universe: u64,
}

impl<'a> Maxspeeds<'a> {
    pub fn empty() -> Maxspeeds<'static> {
        Maxspeeds {
            forward_ids: EliasFanoView::empty(),
            forward_codes: &[],
            bidirectional: Vec::new(),
        }
    }

    /// assembles a store from parts already validated by the loader.
    pub(crate) fn from_parts(
        forward_ids: EliasFanoView<'a>,
        forward_codes: &'a [u8],
        bidirectional: Vec<FeatureMaxspeed>,
    ) -> Maxspeeds<'a> {
        Maxspeeds {
            forward_ids,
            forward_codes,
            bidirectional,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.forward_ids.is_empty() && self.bidirectional.is_empty()
    }

    /// speed limits of `feature_id`. features without data get an invalid
    /// [Maxspeed], which is not an error.
    pub fn get(&self, feature_id: u32) -> Maxspeed {
        if self.is_empty() {
            return Maxspeed::default();
        }
        if let Some(index) = self.forward_ids.rank(feature_id) {
            return match self.forward_codes.get(index) {
                Some(code) => {
                    let speed = maxspeed_converter().macro_to_speed(SpeedMacro(*code));
                    Maxspeed::forward_only(speed.units, speed.speed)
                }
                None => Maxspeed::default(),
            };
        }
        match self.find_bidirectional(feature_id) {
            Some(record) => record.maxspeed,
            None => Maxspeed::default(),
        }
    }

    pub fn has_forward_only(&self, feature_id: u32) -> bool {
        self.forward_ids.contains(feature_id)
    }

    pub fn has_bidirectional(&self, feature_id: u32) -> bool {
        self.find_bidirectional(feature_id).is_some()
    }

    pub fn forward_only_count(&self) -> usize {
        self.forward_ids.len()
    }

    pub fn bidirectional_count(&self) -> usize {
        self.bidirectional.len()
    }

    pub fn stats(&self) -> MaxspeedsStats {
        MaxspeedsStats {
            forward_only_count: self.forward_only_count(),
            bidirectional_count: self.bidirectional_count(),
            forward_universe: self.forward_ids.universe(),
        }
    }

    /// every stored feature and its limits, in feature id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Maxspeed)> + '_ {
        let forward = self.forward_ids.iter().map(move |id| (id, self.get(id)));
        let bidirectional = self.bidirectional.iter().map(|r| (r.feature_id, r.maxspeed));
        itertools::merge_join_by(forward, bidirectional, |a, b| a.0.cmp(&b.0))
            .map(|either| either.reduce(|forward, _| forward))
    }

    fn find_bidirectional(&self, feature_id: u32) -> Option<&FeatureMaxspeed> {
        self.bidirectional
            .binary_search_by_key(&feature_id, |r| r.feature_id)
            .ok()
            .and_then(|idx| self.bidirectional.get(idx))
    }
}

impl Default for Maxspeeds<'_> {
    fn default() -> Self {
        Maxspeeds::empty()
    }
}

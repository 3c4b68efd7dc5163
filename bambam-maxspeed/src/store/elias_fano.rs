//! Elias-Fano encoding of a strictly increasing set of feature ids.
//!
//! each id `x` is split into `low_bits` low bits, stored verbatim in a packed
//! array, and a high part `x >> low_bits`, stored in unary in the "upper"
//! bitvector: the i-th id sets bit `(x >> low_bits) + i`. every run of set bits
//! between two zeros is one bucket of ids sharing a high part, so the ids of
//! bucket `h` start right after the h-th zero. a sampled table of zero
//! positions (`hints`) makes finding that zero a short forward scan.
//!
//! frozen layout, all integers little-endian:
//!
//! ```text
//! u64 universe                 ids are in [0, universe)
//! u32 len                      number of ids
//! u32 low_bits
//! u32 hint_count
//! u32 reserved
//! u64 hints[hint_count]        position of every SELECT_ZERO_STRIDE-th zero
//! u64 low_words[ceil(len * low_bits / 64)]
//! u64 upper_words[ceil((len + ((universe - 1) >> low_bits) + 1) / 64)]
//! ```
//!
//! [EliasFanoView] reads this layout in place, it never copies the words.

use std::cmp::Ordering;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::MaxspeedError;

pub const EF_HEADER_LEN: usize = 24;
const SELECT_ZERO_STRIDE: u64 = 256;
const WORD_BYTES: usize = 8;

/// collects ids in ascending order and freezes them into the byte layout.
#[derive(Debug, Clone)]
pub struct EliasFanoBuilder {
    universe: u64,
    ids: Vec<u32>,
}

impl EliasFanoBuilder {
    pub fn new(universe: u64) -> EliasFanoBuilder {
        EliasFanoBuilder {
            universe,
            ids: Vec::new(),
        }
    }

    pub fn with_capacity(universe: u64, capacity: usize) -> EliasFanoBuilder {
        EliasFanoBuilder {
            universe,
            ids: Vec::with_capacity(capacity),
        }
    }

    /// appends an id. ids must be strictly increasing and below the universe.
    pub fn push(&mut self, id: u32) -> Result<(), MaxspeedError> {
        if id as u64 >= self.universe {
            return Err(MaxspeedError::InternalError(format!(
                "id {id} is outside of the Elias-Fano universe [0, {})",
                self.universe
            )));
        }
        match self.ids.last() {
            Some(previous) if *previous == id => Err(MaxspeedError::DuplicateFeature(id)),
            Some(previous) if *previous > id => Err(MaxspeedError::UnsortedRecords {
                previous: *previous,
                current: id,
            }),
            _ => {
                self.ids.push(id);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn freeze(&self) -> Result<Vec<u8>, MaxspeedError> {
        let len = self.ids.len() as u64;
        let low_bits = low_bit_width(self.universe, len);
        let upper_len = upper_bit_len(self.universe, len, low_bits).ok_or_else(|| {
            MaxspeedError::InternalError(String::from("Elias-Fano upper bits overflow"))
        })?;
        let mask = low_mask(low_bits);

        let mut low = vec![0u64; words_for(len * low_bits as u64)];
        let mut upper = vec![0u64; words_for(upper_len)];
        for (idx, id) in self.ids.iter().enumerate() {
            let id = *id as u64;
            let idx = idx as u64;
            write_bits(&mut low, idx * low_bits as u64, low_bits, id & mask);
            let pos = (id >> low_bits) + idx;
            upper[(pos / 64) as usize] |= 1 << (pos % 64);
        }

        let mut hints = Vec::new();
        let mut zeros = 0u64;
        for pos in 0..upper_len {
            if (upper[(pos / 64) as usize] >> (pos % 64)) & 1 == 0 {
                if zeros % SELECT_ZERO_STRIDE == 0 {
                    hints.push(pos);
                }
                zeros += 1;
            }
        }

        let words = hints.len() + low.len() + upper.len();
        let mut out = Vec::with_capacity(EF_HEADER_LEN + words * WORD_BYTES);
        out.write_u64::<LittleEndian>(self.universe)?;
        out.write_u32::<LittleEndian>(len as u32)?;
        out.write_u32::<LittleEndian>(low_bits)?;
        out.write_u32::<LittleEndian>(hints.len() as u32)?;
        out.write_u32::<LittleEndian>(0)?;
        for word in hints.iter().chain(low.iter()).chain(upper.iter()) {
            out.write_u64::<LittleEndian>(*word)?;
        }
        Ok(out)
    }
}

/// read-only Elias-Fano set borrowed from a frozen byte region.
#[derive(Debug, Clone, Copy)]
pub struct EliasFanoView<'a> {
    universe: u64,
    len: u64,
    low_bits: u32,
    upper_len: u64,
    hints: &'a [u8],
    low: &'a [u8],
    upper: &'a [u8],
}

impl<'a> EliasFanoView<'a> {
    /// a set with no ids.
    pub fn empty() -> EliasFanoView<'static> {
        EliasFanoView {
            universe: 0,
            len: 0,
            low_bits: 0,
            upper_len: 0,
            hints: &[],
            low: &[],
            upper: &[],
        }
    }

    /// maps a frozen region. the region must hold exactly one frozen set.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<EliasFanoView<'a>, MaxspeedError> {
        let corrupt = |msg: &str| MaxspeedError::CorruptSection(format!("elias-fano {msg}"));
        if bytes.len() < EF_HEADER_LEN {
            return Err(corrupt(&format!(
                "region has {} bytes, smaller than its header",
                bytes.len()
            )));
        }
        let universe = LittleEndian::read_u64(&bytes[0..8]);
        let len = LittleEndian::read_u32(&bytes[8..12]) as u64;
        let low_bits = LittleEndian::read_u32(&bytes[12..16]);
        let hint_count = LittleEndian::read_u32(&bytes[16..20]) as u64;
        if len > universe {
            return Err(corrupt(&format!("holds {len} ids in a universe of {universe}")));
        }
        if low_bits != low_bit_width(universe, len) {
            return Err(corrupt(&format!("has unexpected low bit width {low_bits}")));
        }
        let upper_len = upper_bit_len(universe, len, low_bits)
            .ok_or_else(|| corrupt("upper bit length overflows"))?;
        let zeros = upper_len - len;
        if hint_count != zeros.div_ceil(SELECT_ZERO_STRIDE) {
            return Err(corrupt(&format!("has {hint_count} hints for {zeros} buckets")));
        }

        let hint_bytes = region_bytes(hint_count);
        let low_bytes = len
            .checked_mul(low_bits as u64)
            .and_then(|bits| region_bytes(words_for(bits) as u64));
        let upper_bytes = region_bytes(words_for(upper_len) as u64);
        let (hint_bytes, low_bytes, upper_bytes) = match (hint_bytes, low_bytes, upper_bytes) {
            (Some(h), Some(l), Some(u)) => (h, l, u),
            _ => return Err(corrupt("region size overflows")),
        };
        let expected = EF_HEADER_LEN + hint_bytes + low_bytes + upper_bytes;
        if bytes.len() != expected {
            return Err(corrupt(&format!(
                "region has {} bytes, expected {expected}",
                bytes.len()
            )));
        }

        let (hints, rest) = bytes[EF_HEADER_LEN..].split_at(hint_bytes);
        let (low, upper) = rest.split_at(low_bytes);
        Ok(EliasFanoView {
            universe,
            len,
            low_bits,
            upper_len,
            hints,
            low,
            upper,
        })
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn universe(&self) -> u64 {
        self.universe
    }

    pub fn contains(&self, id: u32) -> bool {
        self.rank(id).is_some()
    }

    /// for an id in the set, the number of ids that precede it, which is its
    /// index in any dense array laid out in id order. `None` if absent.
    ///
    /// finding the bucket of `id` takes a hint lookup plus a short scan, but
    /// the bucket itself is scanned linearly. ids sharing a high part are at
    /// most `2^low_bits` apart, so with evenly spread ids a bucket holds about
    /// one id. a dense block of ids inside a wide universe, such as a few
    /// thousand consecutive ids next to one id near `u32::MAX`, puts the whole
    /// block in a few buckets and makes lookups in it linear in block size.
    pub fn rank(&self, id: u32) -> Option<usize> {
        let id = id as u64;
        if self.len == 0 || id >= self.universe {
            return None;
        }
        let high = id >> self.low_bits;
        let low = id & low_mask(self.low_bits);
        let mut pos = if high == 0 {
            0
        } else {
            self.select_zero(high - 1)? + 1
        };
        let mut index = pos.checked_sub(high)?;
        while pos < self.upper_len && self.upper_bit(pos)? {
            match self.low(index)?.cmp(&low) {
                Ordering::Equal => return Some(index as usize),
                Ordering::Greater => return None,
                Ordering::Less => {}
            }
            pos += 1;
            index += 1;
        }
        None
    }

    /// the ids of this set in ascending order.
    pub fn iter(&self) -> EliasFanoIter<'a> {
        EliasFanoIter {
            view: *self,
            pos: 0,
            index: 0,
        }
    }

    /// position in the upper bits of the zero preceded by `rank` other zeros.
    fn select_zero(&self, rank: u64) -> Option<u64> {
        let start = read_word(self.hints, (rank / SELECT_ZERO_STRIDE) as usize)?;
        let mut remaining = rank % SELECT_ZERO_STRIDE;
        let mut word_idx = start / 64;
        let mut zeros = !read_word(self.upper, word_idx as usize)? & (u64::MAX << (start % 64));
        loop {
            let count = zeros.count_ones() as u64;
            if remaining < count {
                return Some(word_idx * 64 + select_in_word(zeros, remaining));
            }
            remaining -= count;
            word_idx += 1;
            zeros = !read_word(self.upper, word_idx as usize)?;
        }
    }

    fn upper_bit(&self, pos: u64) -> Option<bool> {
        let word = read_word(self.upper, (pos / 64) as usize)?;
        Some((word >> (pos % 64)) & 1 == 1)
    }

    fn low(&self, index: u64) -> Option<u64> {
        if self.low_bits == 0 {
            return Some(0);
        }
        let offset = index * self.low_bits as u64;
        let word_idx = (offset / 64) as usize;
        let shift = offset % 64;
        let mut value = read_word(self.low, word_idx)? >> shift;
        if shift + self.low_bits as u64 > 64 {
            value |= read_word(self.low, word_idx + 1)? << (64 - shift);
        }
        Some(value & low_mask(self.low_bits))
    }
}

pub struct EliasFanoIter<'a> {
    view: EliasFanoView<'a>,
    pos: u64,
    index: u64,
}

impl Iterator for EliasFanoIter<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while self.pos < self.view.upper_len && self.index < self.view.len {
            let set = self.view.upper_bit(self.pos)?;
            self.pos += 1;
            if set {
                let high = self.pos - 1 - self.index;
                let low = self.view.low(self.index)?;
                self.index += 1;
                return Some(((high << self.view.low_bits) | low) as u32);
            }
        }
        None
    }
}

fn low_bit_width(universe: u64, len: u64) -> u32 {
    if len == 0 || universe <= len {
        0
    } else {
        (universe / len).ilog2().min(32)
    }
}

fn upper_bit_len(universe: u64, len: u64, low_bits: u32) -> Option<u64> {
    let max_high = universe.saturating_sub(1) >> low_bits;
    len.checked_add(max_high)?.checked_add(1)
}

fn low_mask(low_bits: u32) -> u64 {
    if low_bits == 0 {
        0
    } else {
        u64::MAX >> (64 - low_bits)
    }
}

fn words_for(bits: u64) -> usize {
    bits.div_ceil(64) as usize
}

fn region_bytes(words: u64) -> Option<usize> {
    usize::try_from(words).ok()?.checked_mul(WORD_BYTES)
}

fn write_bits(words: &mut [u64], offset: u64, width: u32, value: u64) {
    if width == 0 {
        return;
    }
    let word_idx = (offset / 64) as usize;
    let shift = offset % 64;
    words[word_idx] |= value << shift;
    if shift + width as u64 > 64 {
        words[word_idx + 1] |= value >> (64 - shift);
    }
}

fn read_word(bytes: &[u8], word_idx: usize) -> Option<u64> {
    let start = word_idx.checked_mul(WORD_BYTES)?;
    let word = bytes.get(start..start + WORD_BYTES)?;
    Some(LittleEndian::read_u64(word))
}

/// position of the set bit preceded by `rank` other set bits in `word`.
fn select_in_word(mut word: u64, rank: u64) -> u64 {
    for _ in 0..rank {
        word &= word - 1;
    }
    word.trailing_zeros() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freeze(universe: u64, ids: &[u32]) -> Vec<u8> {
        let mut builder = EliasFanoBuilder::new(universe);
        for id in ids {
            builder.push(*id).unwrap();
        }
        builder.freeze().unwrap()
    }

    fn assert_set(ids: &[u32], universe: u64) {
        let bytes = freeze(universe, ids);
        let view = EliasFanoView::from_bytes(&bytes).unwrap();
        assert_eq!(view.len(), ids.len());
        for (idx, id) in ids.iter().enumerate() {
            assert_eq!(view.rank(*id), Some(idx), "rank of {id}");
        }
        let members: std::collections::HashSet<u32> = ids.iter().copied().collect();
        for id in 0..universe.min(20_000) as u32 {
            assert_eq!(view.contains(id), members.contains(&id), "contains {id}");
        }
        assert_eq!(view.iter().collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_single_id_zero() {
        assert_set(&[0], 1);
    }

    #[test]
    fn test_sparse_ids() {
        assert_set(&[0, 5, 1000, 19_999, 1_000_000], 1_000_001);
    }

    #[test]
    fn test_dense_ids_have_no_low_bits() {
        let ids: Vec<u32> = (0..5000).collect();
        let bytes = freeze(5000, &ids);
        let view = EliasFanoView::from_bytes(&bytes).unwrap();
        assert_eq!(view.low_bits, 0);
        assert_set(&ids, 5000);
    }

    #[test]
    fn test_many_buckets_cross_hint_strides() {
        let ids: Vec<u32> = (0..60_000).filter(|i| i % 7 == 0 || i % 11 == 3).collect();
        let universe = *ids.last().unwrap() as u64 + 1;
        assert_set(&ids, universe);
    }

    #[test]
    fn test_clustered_ids() {
        let mut ids: Vec<u32> = (100..400).collect();
        ids.extend(15_000..15_010);
        ids.push(u32::MAX - 1);
        let bytes = freeze(u32::MAX as u64, &ids);
        let view = EliasFanoView::from_bytes(&bytes).unwrap();
        for (idx, id) in ids.iter().enumerate() {
            assert_eq!(view.rank(*id), Some(idx));
        }
        assert!(!view.contains(99));
        assert!(!view.contains(400));
        assert!(!view.contains(14_999));
        assert!(!view.contains(u32::MAX - 2));
        assert!(!view.contains(u32::MAX));
        assert_eq!(view.iter().collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_dense_block_in_wide_universe() {
        let mut ids: Vec<u32> = (0..5_000).collect();
        ids.push(u32::MAX - 1);
        let bytes = freeze(u32::MAX as u64, &ids);
        let view = EliasFanoView::from_bytes(&bytes).unwrap();
        assert_eq!(view.rank(0), Some(0));
        assert_eq!(view.rank(4_999), Some(4_999));
        assert_eq!(view.rank(u32::MAX - 1), Some(5_000));
        assert_eq!(view.rank(5_000), None);
        assert_eq!(view.iter().count(), ids.len());
    }

    #[test]
    fn test_ids_outside_universe_are_absent() {
        let bytes = freeze(11, &[3, 10]);
        let view = EliasFanoView::from_bytes(&bytes).unwrap();
        assert!(view.contains(10));
        assert!(!view.contains(11));
        assert!(!view.contains(500));
    }

    #[test]
    fn test_empty_view() {
        let view = EliasFanoView::empty();
        assert!(view.is_empty());
        assert!(!view.contains(0));
        assert_eq!(view.iter().count(), 0);
    }

    #[test]
    fn test_push_rejects_unsorted_and_duplicate_ids() {
        let mut builder = EliasFanoBuilder::new(100);
        builder.push(5).unwrap();
        assert!(matches!(
            builder.push(5),
            Err(MaxspeedError::DuplicateFeature(5))
        ));
        assert!(matches!(
            builder.push(4),
            Err(MaxspeedError::UnsortedRecords {
                previous: 5,
                current: 4
            })
        ));
        assert!(builder.push(100).is_err());
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_from_bytes_rejects_bad_lengths() {
        let bytes = freeze(1000, &[1, 2, 500]);
        assert!(EliasFanoView::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(EliasFanoView::from_bytes(&bytes[..10]).is_err());
        let mut longer = bytes.clone();
        longer.push(0);
        assert!(EliasFanoView::from_bytes(&longer).is_err());
    }

    #[test]
    fn test_select_in_word() {
        let word = 0b1011_0100u64;
        assert_eq!(select_in_word(word, 0), 2);
        assert_eq!(select_in_word(word, 1), 4);
        assert_eq!(select_in_word(word, 2), 5);
        assert_eq!(select_in_word(word, 3), 7);
    }
}

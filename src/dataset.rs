//! Synthetic household-registry records for the write benchmarks.
//!
//! Generation is seeded (ChaCha8) so a run can be reproduced exactly; the
//! natural key (`external_id`, a 14-digit code) is guaranteed unique within a
//! batch so key-set cardinality matches the requested record count.

use chrono::NaiveDate;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

const NAME_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz ";
const NAME_LEN: usize = 10;
const EXTERNAL_ID_LEN: usize = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

/// One synthetic registry member. `external_id` later feeds the update
/// benchmarks as a reference key.
#[derive(Clone, Debug)]
pub struct MemberRecord {
    pub external_id: String,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
}

/// A pending name change keyed by the natural key.
#[derive(Clone, Debug)]
pub struct NameUpdate {
    pub full_name: String,
    pub external_id: String,
}

pub struct BatchGenerator {
    rng: ChaCha8Rng,
}

impl BatchGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Generate `count` records with batch-unique external ids.
    pub fn member_batch(&mut self, count: usize) -> Vec<MemberRecord> {
        let mut seen = HashSet::with_capacity(count);
        let mut batch = Vec::with_capacity(count);
        while batch.len() < count {
            let external_id = self.external_id();
            if !seen.insert(external_id.clone()) {
                continue;
            }
            batch.push(MemberRecord {
                external_id,
                full_name: self.full_name(),
                birth_date: self.birth_date(),
                gender: self.gender(),
            });
        }
        batch
    }

    /// Pair each key with a freshly generated replacement name.
    pub fn name_updates(&mut self, keys: Vec<String>) -> Vec<NameUpdate> {
        keys.into_iter()
            .map(|external_id| NameUpdate {
                full_name: self.full_name(),
                external_id,
            })
            .collect()
    }

    fn external_id(&mut self) -> String {
        (0..EXTERNAL_ID_LEN)
            .map(|_| char::from(b'0' + self.rng.gen_range(0..10u8)))
            .collect()
    }

    fn full_name(&mut self) -> String {
        (0..NAME_LEN)
            .map(|_| char::from(NAME_CHARSET[self.rng.gen_range(0..NAME_CHARSET.len())]))
            .collect()
    }

    fn birth_date(&mut self) -> NaiveDate {
        let year = self.rng.gen_range(1940..=2010);
        let month = self.rng.gen_range(1..=12);
        // Day capped at 28 so every (year, month) combination is valid.
        let day = self.rng.gen_range(1..=28);
        NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
    }

    fn gender(&mut self) -> Gender {
        match self.rng.gen_range(0..3u8) {
            0 => Gender::Male,
            1 => Gender::Female,
            _ => Gender::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_ids_are_14_digits() {
        let mut generator = BatchGenerator::new(7);
        for record in generator.member_batch(100) {
            assert_eq!(record.external_id.len(), 14);
            assert!(record.external_id.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn batch_keys_are_unique() {
        let mut generator = BatchGenerator::new(42);
        let batch = generator.member_batch(5_000);
        let keys: HashSet<&str> = batch.iter().map(|r| r.external_id.as_str()).collect();
        assert_eq!(keys.len(), batch.len());
    }

    #[test]
    fn same_seed_same_batch() {
        let a = BatchGenerator::new(99).member_batch(50);
        let b = BatchGenerator::new(99).member_batch(50);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.external_id, y.external_id);
            assert_eq!(x.full_name, y.full_name);
            assert_eq!(x.birth_date, y.birth_date);
            assert_eq!(x.gender, y.gender);
        }
    }

    #[test]
    fn updates_keep_key_order() {
        let mut generator = BatchGenerator::new(1);
        let keys = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let updates = generator.name_updates(keys.clone());
        let got: Vec<&str> = updates.iter().map(|u| u.external_id.as_str()).collect();
        assert_eq!(got, keys);
    }
}

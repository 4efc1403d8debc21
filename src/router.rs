// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Routes (bank, preset, key) lookups to samples.
//!
//! Each (bank, preset) pair owns a set of inclusive key ranges, each bound to
//! one sample. What happens when ranges overlap depends on the router's
//! [`OverlapPolicy`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::SampleHandle;
use crate::error::{check_key, check_program, BindFailure, Error};

/// How the router treats a key range that overlaps one already bound in the
/// same bank and preset.
#[derive(Deserialize, Clone, Copy, Serialize, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Refuse the new range.
    #[default]
    Reject,
    /// Accept the new range. Lookups prefer the most recently bound range.
    LastWins,
}

/// An inclusive key range bound to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    lokey: u8,
    hikey: u8,
    sample: SampleHandle,
}

impl KeyRange {
    /// Creates a key range. Both keys must be in [0, 127] and lokey must not exceed hikey.
    pub fn new(lokey: u8, hikey: u8, sample: SampleHandle) -> Result<KeyRange, Error> {
        check_key("low key", lokey)?;
        check_key("high key", hikey)?;
        if lokey > hikey {
            return Err(Error::InvalidArgument(format!(
                "low key {} is above high key {}",
                lokey, hikey
            )));
        }
        Ok(KeyRange {
            lokey,
            hikey,
            sample,
        })
    }

    pub fn lokey(&self) -> u8 {
        self.lokey
    }

    pub fn hikey(&self) -> u8 {
        self.hikey
    }

    pub fn sample(&self) -> SampleHandle {
        self.sample
    }

    /// Returns true if the key falls within this range.
    pub fn covers(&self, key: u8) -> bool {
        self.lokey <= key && key <= self.hikey
    }

    /// Returns true if the two ranges share at least one key.
    pub fn overlaps(&self, other: &KeyRange) -> bool {
        self.lokey <= other.hikey && other.lokey <= self.hikey
    }
}

struct Binding {
    range: KeyRange,
    /// Bind order, used to pick the latest range under [`OverlapPolicy::LastWins`].
    order: u64,
}

/// Key ranges for every bank and preset of one synthesizer.
pub struct KeyRangeRouter {
    policy: OverlapPolicy,
    buckets: HashMap<(u16, u8), Vec<Binding>>,
    next_order: u64,
}

impl KeyRangeRouter {
    /// Creates an empty router.
    pub fn new(policy: OverlapPolicy) -> KeyRangeRouter {
        KeyRangeRouter {
            policy,
            buckets: HashMap::new(),
            next_order: 0,
        }
    }

    /// Checks that the range could be bound to the bank and preset without
    /// changing anything.
    pub fn check(&self, bank: u16, preset: u8, range: &KeyRange) -> Result<(), Error> {
        check_program(bank, preset)?;
        if self.policy == OverlapPolicy::LastWins {
            return Ok(());
        }

        let existing = self
            .buckets
            .get(&(bank, preset))
            .and_then(|bindings| bindings.iter().find(|b| b.range.overlaps(range)));
        match existing {
            Some(existing) => Err(Error::Bind {
                sample: range.sample,
                bank,
                preset,
                lokey: range.lokey,
                hikey: range.hikey,
                reason: BindFailure::Overlap {
                    sample: existing.range.sample,
                    lokey: existing.range.lokey,
                    hikey: existing.range.hikey,
                },
            }),
            None => Ok(()),
        }
    }

    /// Adds a range that has already passed [`KeyRangeRouter::check`].
    pub fn insert(&mut self, bank: u16, preset: u8, range: KeyRange) {
        let order = self.next_order;
        self.next_order += 1;
        self.buckets
            .entry((bank, preset))
            .or_default()
            .push(Binding { range, order });
        debug!(
            bank,
            preset,
            lokey = range.lokey,
            hikey = range.hikey,
            sample = %range.sample,
            "Bound key range"
        );
    }

    /// Binds a sample to an inclusive key range of a bank and preset.
    pub fn bind(
        &mut self,
        bank: u16,
        preset: u8,
        lokey: u8,
        hikey: u8,
        sample: SampleHandle,
    ) -> Result<KeyRange, Error> {
        let range = KeyRange::new(lokey, hikey, sample)?;
        self.check(bank, preset, &range)?;
        self.insert(bank, preset, range);
        Ok(range)
    }

    /// Removes every range of the sample in the bank and preset.
    pub fn unbind(
        &mut self,
        bank: u16,
        preset: u8,
        sample: SampleHandle,
    ) -> Result<Vec<KeyRange>, Error> {
        let not_found = || {
            Error::NotFound(format!(
                "sample {} is not bound in bank {}, preset {}",
                sample, bank, preset
            ))
        };

        let bindings = self
            .buckets
            .get_mut(&(bank, preset))
            .ok_or_else(not_found)?;
        let removed: Vec<KeyRange> = bindings
            .iter()
            .filter(|b| b.range.sample == sample)
            .map(|b| b.range)
            .collect();
        if removed.is_empty() {
            return Err(not_found());
        }

        bindings.retain(|b| b.range.sample != sample);
        if bindings.is_empty() {
            self.buckets.remove(&(bank, preset));
        }
        debug!(bank, preset, sample = %sample, ranges = removed.len(), "Unbound sample");
        Ok(removed)
    }

    /// Removes the sample from every bank and preset, returning the pairs it was bound in.
    pub fn unbind_all(&mut self, sample: SampleHandle) -> Vec<(u16, u8)> {
        let mut programs: Vec<(u16, u8)> = self
            .buckets
            .iter()
            .filter(|(_, bindings)| bindings.iter().any(|b| b.range.sample == sample))
            .map(|(program, _)| *program)
            .collect();
        programs.sort();

        for program in &programs {
            if let Some(bindings) = self.buckets.get_mut(program) {
                bindings.retain(|b| b.range.sample != sample);
                if bindings.is_empty() {
                    self.buckets.remove(program);
                }
            }
        }
        programs
    }

    /// Finds the sample whose range covers the key, if any.
    pub fn resolve(&self, bank: u16, preset: u8, key: u8) -> Option<SampleHandle> {
        self.buckets
            .get(&(bank, preset))?
            .iter()
            .filter(|b| b.range.covers(key))
            .max_by_key(|b| b.order)
            .map(|b| b.range.sample)
    }

    /// The ranges of a bank and preset, in bind order.
    pub fn ranges(&self, bank: u16, preset: u8) -> Vec<KeyRange> {
        self.buckets
            .get(&(bank, preset))
            .map(|bindings| bindings.iter().map(|b| b.range).collect())
            .unwrap_or_default()
    }

    /// Every binding as (bank, preset, range), sorted by bank, preset and low key.
    pub fn bindings(&self) -> Vec<(u16, u8, KeyRange)> {
        let mut all: Vec<(u16, u8, KeyRange)> = self
            .buckets
            .iter()
            .flat_map(|(&(bank, preset), bindings)| {
                bindings.iter().map(move |b| (bank, preset, b.range))
            })
            .collect();
        all.sort_by_key(|(bank, preset, range)| (*bank, *preset, range.lokey, range.hikey));
        all
    }

    /// Removes every binding.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    /// The number of bound ranges.
    pub fn len(&self) -> usize {
        self.buckets.values().map(|bindings| bindings.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const A: SampleHandle = SampleHandle(0);
    const B: SampleHandle = SampleHandle(1);

    #[test]
    fn test_resolve() {
        let mut router = KeyRangeRouter::new(OverlapPolicy::Reject);
        router.bind(0, 0, 50, 58, A).unwrap();

        assert_eq!(router.resolve(0, 0, 54), Some(A));
        assert_eq!(router.resolve(0, 0, 50), Some(A));
        assert_eq!(router.resolve(0, 0, 58), Some(A));
        assert_eq!(router.resolve(0, 0, 49), None);
        assert_eq!(router.resolve(0, 0, 59), None);

        // Other programs are separate.
        assert_eq!(router.resolve(0, 1, 54), None);
        assert_eq!(router.resolve(1, 0, 54), None);
    }

    #[test]
    fn test_single_key_ranges() {
        let mut router = KeyRangeRouter::new(OverlapPolicy::Reject);
        router.bind(0, 0, 59, 59, A).unwrap();
        router.bind(0, 0, 60, 60, B).unwrap();

        assert_eq!(router.resolve(0, 0, 59), Some(A));
        assert_eq!(router.resolve(0, 0, 60), Some(B));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_invalid_ranges() {
        let mut router = KeyRangeRouter::new(OverlapPolicy::Reject);
        for (lokey, hikey) in [(60, 59), (0, 128), (128, 128)] {
            let err = router.bind(0, 0, lokey, hikey, A).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }

        let err = router.bind(16384, 0, 0, 1, A).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = router.bind(0, 128, 0, 1, A).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        assert!(router.is_empty());
    }

    #[test]
    fn test_overlap_rejected() {
        let mut router = KeyRangeRouter::new(OverlapPolicy::Reject);
        router.bind(0, 0, 50, 58, A).unwrap();

        let err = router.bind(0, 0, 58, 60, B).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bind);
        assert!(matches!(
            err,
            Error::Bind {
                reason: BindFailure::Overlap {
                    sample: A,
                    lokey: 50,
                    hikey: 58
                },
                ..
            }
        ));
        assert_eq!(router.resolve(0, 0, 58), Some(A));
        assert_eq!(router.resolve(0, 0, 60), None);

        // The same keys in another preset are fine.
        router.bind(0, 1, 50, 58, B).unwrap();
    }

    #[test]
    fn test_overlap_last_wins() {
        let mut router = KeyRangeRouter::new(OverlapPolicy::LastWins);
        router.bind(0, 0, 50, 58, A).unwrap();
        router.bind(0, 0, 55, 60, B).unwrap();

        assert_eq!(router.resolve(0, 0, 52), Some(A));
        assert_eq!(router.resolve(0, 0, 56), Some(B));
        assert_eq!(router.resolve(0, 0, 60), Some(B));

        router.unbind(0, 0, B).unwrap();
        assert_eq!(router.resolve(0, 0, 56), Some(A));
    }

    #[test]
    fn test_unbind() {
        let mut router = KeyRangeRouter::new(OverlapPolicy::Reject);
        router.bind(0, 0, 50, 52, A).unwrap();
        router.bind(0, 0, 60, 62, A).unwrap();
        router.bind(0, 0, 70, 72, B).unwrap();

        let err = router.unbind(0, 1, A).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let removed = router.unbind(0, 0, A).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(router.resolve(0, 0, 51), None);
        assert_eq!(router.resolve(0, 0, 71), Some(B));

        let err = router.unbind(0, 0, A).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_unbind_all() {
        let mut router = KeyRangeRouter::new(OverlapPolicy::Reject);
        router.bind(2, 5, 10, 20, A).unwrap();
        router.bind(0, 0, 50, 52, A).unwrap();
        router.bind(0, 0, 60, 62, B).unwrap();

        assert_eq!(router.unbind_all(A), vec![(0, 0), (2, 5)]);
        assert!(router.unbind_all(A).is_empty());
        assert_eq!(router.bindings().len(), 1);
        assert_eq!(router.ranges(0, 0), vec![KeyRange::new(60, 62, B).unwrap()]);
    }

    #[test]
    fn test_bindings_sorted() {
        let mut router = KeyRangeRouter::new(OverlapPolicy::Reject);
        router.bind(1, 0, 0, 10, B).unwrap();
        router.bind(0, 0, 60, 62, A).unwrap();
        router.bind(0, 0, 40, 42, B).unwrap();

        let keys: Vec<(u16, u8, u8)> = router
            .bindings()
            .iter()
            .map(|(bank, preset, range)| (*bank, *preset, range.lokey()))
            .collect();
        assert_eq!(keys, vec![(0, 0, 40), (0, 0, 60), (1, 0, 0)]);

        router.clear();
        assert!(router.is_empty());
    }
}

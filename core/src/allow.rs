//! Allow-lists: which drawn values a caller is willing to accept.
//!
//! On the wire an allow-list is a codec string with one symbol per
//! value: `A` (0) denies the value, `B` (1) allows it.

use crate::{
    codec,
    error::{DeskError, DeskResult},
    ledger::WeightVector,
    types::Value,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    mask: Vec<bool>,
}

impl AllowList {
    /// Every value allowed.
    pub fn all(len: usize) -> Self {
        Self {
            mask: vec![true; len],
        }
    }

    /// Only the listed values allowed. Values outside `0..len` are ignored.
    pub fn only<I: IntoIterator<Item = Value>>(values: I, len: usize) -> Self {
        let mut mask = vec![false; len];
        for v in values {
            if let Some(slot) = mask.get_mut(v) {
                *slot = true;
            }
        }
        Self { mask }
    }

    /// Decode the wire form. `None` means no restriction.
    pub fn decode(encoded: Option<&str>, len: usize) -> DeskResult<Self> {
        let Some(encoded) = encoded else {
            return Ok(Self::all(len));
        };
        let digits = codec::decode(encoded).map_err(|e| invalid(e.to_string()))?;
        if digits.len() != len {
            return Err(invalid(format!(
                "expected {len} entries, got {}",
                digits.len()
            )));
        }
        let mask = digits
            .into_iter()
            .map(|d| match d {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(invalid(format!("entry {other} is neither 0 nor 1"))),
            })
            .collect::<DeskResult<Vec<_>>>()?;
        Ok(Self { mask })
    }

    pub fn encode(&self) -> String {
        self.mask.iter().map(|&on| if on { 'B' } else { 'A' }).collect()
    }

    pub fn len(&self) -> usize {
        self.mask.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn contains(&self, value: Value) -> bool {
        self.mask.get(value).copied().unwrap_or(false)
    }

    pub fn allowed(&self) -> impl Iterator<Item = Value> + '_ {
        self.mask
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(v, _)| v)
    }

    /// Fail unless some allowed value can actually be drawn.
    /// Without this a filtered draw would never terminate.
    pub fn ensure_reachable(&self, weights: &WeightVector) -> DeskResult<()> {
        if self.mask.len() != weights.len() {
            return Err(invalid(format!(
                "covers {} values, weight vector has {}",
                self.mask.len(),
                weights.len()
            )));
        }
        if weights.support().any(|v| self.contains(v)) {
            Ok(())
        } else {
            Err(invalid("no drawable value is allowed".to_string()))
        }
    }
}

fn invalid(reason: String) -> DeskError {
    DeskError::InvalidAllowList { reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_means_everything() {
        let allow = AllowList::decode(None, 4).unwrap();
        assert_eq!(allow.allowed().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn decodes_mask() {
        let allow = AllowList::decode(Some("ABAB"), 4).unwrap();
        assert_eq!(allow.allowed().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(allow.encode(), "ABAB");
    }

    #[test]
    fn rejects_bad_masks() {
        for bad in ["ABA", "ABABA", "ABCA", "AB!A"] {
            assert!(
                matches!(
                    AllowList::decode(Some(bad), 4),
                    Err(DeskError::InvalidAllowList { .. })
                ),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn empty_mask_is_unreachable() {
        let weights = WeightVector::uniform(4);
        let allow = AllowList::decode(Some("AAAA"), 4).unwrap();
        assert!(allow.ensure_reachable(&weights).is_err());
        assert!(AllowList::only([2], 4).ensure_reachable(&weights).is_ok());
    }
}

//! ψ: disputes — the four pairwise-disjoint sets tracking work-report
//! verdicts and offenders (§4.6).

use crate::codec::{Codec, Reader, Writer};
use crate::error::CodecError;
use crate::state::report::OffenderKey;
use crate::types::Hash;
use std::collections::HashSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Disputes {
    pub good: HashSet<Hash>,
    pub bad: HashSet<Hash>,
    pub wonky: HashSet<Hash>,
    pub punish: HashSet<OffenderKey>,
}

impl Disputes {
    /// Which (if any) of the three report sets already contains `target`.
    pub fn classification(&self, target: &Hash) -> Option<&'static str> {
        if self.good.contains(target) {
            Some("good")
        } else if self.bad.contains(target) {
            Some("bad")
        } else if self.wonky.contains(target) {
            Some("wonky")
        } else {
            None
        }
    }

    pub fn is_disjoint(&self) -> bool {
        self.good.is_disjoint(&self.bad)
            && self.good.is_disjoint(&self.wonky)
            && self.bad.is_disjoint(&self.wonky)
    }
}

impl Codec for Disputes {
    fn encode(&self, w: &mut Writer) {
        self.good.encode(w);
        self.bad.encode(w);
        self.wonky.encode(w);
        self.punish.encode(w);
    }

    fn decode(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(Self {
            good: Codec::decode(r)?,
            bad: Codec::decode(r)?,
            wonky: Codec::decode(r)?,
            punish: Codec::decode(r)?,
        })
    }
}

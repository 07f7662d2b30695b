//! Deterministic per-turn RNG streams (§4.2 "Determinism").
//!
//! Every stream is a Mulberry32 generator seeded from a hash of
//! `(BattleId, MatchId, Seed, TurnIndex, Direction)`. No RNG state is ever
//! persisted: a stream is rebuilt from scratch for each turn, so resolution
//! is reproducible bit-for-bit across processes and retries, and the two
//! directions never share state.

use serde::{Deserialize, Serialize};

use crate::ids::{BattleId, MatchId};

/// Which side is attacking in this stream — the tag that keeps the A→B and
/// B→A draws independent even though they share every other input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttackDirection {
    AToB,
    BToA,
}

impl AttackDirection {
    fn tag(self) -> u64 {
        match self {
            AttackDirection::AToB => 0xA2B_u64,
            AttackDirection::BToA => 0xB2A_u64,
        }
    }
}

/// A single Mulberry32 stream plus its draw counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnRng {
    seed: u32,
    counter: u32,
}

impl TurnRng {
    /// Derive the stream for one attack direction of one turn. Pure
    /// function of its inputs — no shared or carried-over state.
    pub fn for_turn(
        battle_id: BattleId,
        match_id: MatchId,
        seed: i64,
        turn_index: u64,
        direction: AttackDirection,
    ) -> Self {
        let stream_seed = derive_stream_seed(battle_id, match_id, seed, turn_index, direction);
        Self {
            seed: stream_seed,
            counter: 0,
        }
    }

    /// Next value in `[0, 1)`. Advances the stream.
    pub fn next_f64(&mut self) -> f64 {
        self.counter = self.counter.wrapping_add(1);
        mulberry32(self.seed.wrapping_add(self.counter))
    }

    /// Draws remaining unused since construction — purely an observability
    /// aid, not consumed by combat math.
    pub fn draws_so_far(&self) -> u32 {
        self.counter
    }
}

/// FNV-1a64 hash of the stream's identifying tuple, folded into a u32 seed.
/// FNV-1a is the teacher's own choice for stable, non-cryptographic content
/// hashing elsewhere in this codebase's persistence layer; reused here for
/// the same reason: cheap, deterministic, and stable across platforms.
fn derive_stream_seed(
    battle_id: BattleId,
    match_id: MatchId,
    seed: i64,
    turn_index: u64,
    direction: AttackDirection,
) -> u32 {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    let mut fold = |bytes: &[u8]| {
        for &b in bytes {
            hash ^= b as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    };

    fold(battle_id.as_uuid().as_bytes());
    fold(match_id.as_uuid().as_bytes());
    fold(&seed.to_le_bytes());
    fold(&turn_index.to_le_bytes());
    fold(&direction.tag().to_le_bytes());

    (hash ^ (hash >> 32)) as u32
}

/// Mulberry32 PRNG: takes a u32 input (seed + counter), returns a value in
/// `[0, 1)`. Uses i32 wrapping arithmetic throughout.
fn mulberry32(input: u32) -> f64 {
    let mut t: i32 = input.wrapping_add(0x6D2B79F5) as i32;

    let lhs = ((t as u32) ^ ((t as u32) >> 15)) as i32;
    let rhs = t | 1;
    t = lhs.wrapping_mul(rhs);

    let lhs2 = ((t as u32) ^ ((t as u32) >> 7)) as i32;
    let rhs2 = t | 61;
    let mul = lhs2.wrapping_mul(rhs2);
    t ^= t.wrapping_add(mul);

    let result = (t as u32) ^ ((t as u32) >> 14);
    result as f64 / 4294967296.0
}

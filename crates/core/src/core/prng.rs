// Minimal PRNG (no external crates).
//
// This is NOT cryptographically secure.
// It drives stimulus delays, digit sequences and math operands, and makes
// whole sessions reproducible from a seed.

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    /// Seed from the wall clock. Good enough for casual play; use `new` for replays.
    pub fn from_clock() -> Self {
        Self::new(crate::time::unix_millis_now() ^ 0xD1B5_4A32_D192_ED03)
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Split off an independent generator (one per phase).
    pub fn fork(&mut self) -> Prng {
        Prng::new(self.next_u64() ^ 0xA076_1D64_78BD_642F)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform integer in `[low, high]` (both inclusive).
    ///
    /// Returns `low` when the range is empty or inverted.
    #[inline]
    pub fn gen_range_inclusive(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        // Widen first: the span of a full i64 range needs 65 bits.
        let span = (high as i128 - low as i128 + 1) as u128;
        // Multiply-shift keeps the modulo bias negligible for the small spans used here.
        let v = ((self.next_u32() as u128 * span) >> 32) as i128;
        (low as i128 + v) as i64
    }

    /// Uniform duration in milliseconds, `[low_ms, high_ms]` inclusive.
    #[inline]
    pub fn gen_millis(&mut self, low_ms: u64, high_ms: u64) -> u64 {
        self.gen_range_inclusive(low_ms as i64, high_ms as i64) as u64
    }

    /// A single decimal digit character `'0'..='9'`.
    #[inline]
    pub fn digit(&mut self) -> char {
        let d = self.gen_range_inclusive(0, 9) as u8;
        char::from(b'0' + d)
    }
}

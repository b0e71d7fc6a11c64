//! Output layer kernels.
//!
//! Every kernel computes the same quantity,
//! `sum(max(own[i], 0) * w_own[i]) + sum(max(opp[i], 0) * w_opp[i])`,
//! with two's-complement `i32` accumulation. Integer addition modulo 2^32 is
//! associative, so the lane grouping a kernel uses cannot change the result:
//! all kernels are bit-identical for identical inputs.
//!
//! Supports:
//! - `x86_64`: `AVX2` (16 lanes, runtime detected) and `SSE2` (8 lanes, baseline)
//! - aarch64: NEON (8 lanes)
//! - Fallback: Scalar

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::HIDDEN_SIZE;

/// Execution strategy for the output layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Kernel {
    Scalar,
    Sse2,
    Avx2,
    Neon,
}

static DETECTED: Lazy<Kernel> = Lazy::new(|| {
    let kernel = [Kernel::Avx2, Kernel::Neon, Kernel::Sse2]
        .into_iter()
        .find(|k| k.is_supported())
        .unwrap_or(Kernel::Scalar);
    log::debug!("nnue output kernel: {kernel}");
    kernel
});

impl Kernel {
    pub const ALL: [Kernel; 4] = [Kernel::Scalar, Kernel::Sse2, Kernel::Avx2, Kernel::Neon];

    /// Widest kernel the running CPU supports (detected once).
    #[must_use]
    pub fn detect() -> Kernel {
        *DETECTED
    }

    /// Whether this kernel can run on the current CPU.
    #[must_use]
    pub fn is_supported(self) -> bool {
        match self {
            Kernel::Scalar => true,
            Kernel::Sse2 => cfg!(target_arch = "x86_64"),
            Kernel::Avx2 => avx2_available(),
            Kernel::Neon => cfg!(target_arch = "aarch64"),
        }
    }

    /// Kernels usable on the current CPU, scalar first.
    #[must_use]
    pub fn available() -> Vec<Kernel> {
        Kernel::ALL.into_iter().filter(|k| k.is_supported()).collect()
    }

    /// This kernel if supported, otherwise the scalar fallback.
    #[must_use]
    pub fn or_scalar(self) -> Kernel {
        if self.is_supported() {
            self
        } else {
            Kernel::Scalar
        }
    }

    /// Number of `i16` lanes processed per step
    #[must_use]
    pub const fn lanes(self) -> usize {
        match self {
            Kernel::Scalar => 1,
            Kernel::Sse2 | Kernel::Neon => 8,
            Kernel::Avx2 => 16,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Kernel::Scalar => "scalar",
            Kernel::Sse2 => "sse2",
            Kernel::Avx2 => "avx2",
            Kernel::Neon => "neon",
        }
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::detect()
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kernel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Kernel::ALL
            .into_iter()
            .find(|k| k.name() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

#[cfg(target_arch = "x86_64")]
#[inline]
fn avx2_available() -> bool {
    is_x86_feature_detected!("avx2")
}

#[cfg(not(target_arch = "x86_64"))]
#[inline]
fn avx2_available() -> bool {
    false
}

// ============================================================================
// Public API - dispatches to the requested kernel
// ============================================================================

/// Clipped-ReLU dot product of both accumulators with their output weights.
///
/// A kernel the CPU cannot run falls back to scalar.
#[inline]
#[must_use]
pub fn relu_dot(
    kernel: Kernel,
    own: &[i16; HIDDEN_SIZE],
    opp: &[i16; HIDDEN_SIZE],
    w_own: &[i16; HIDDEN_SIZE],
    w_opp: &[i16; HIDDEN_SIZE],
) -> i32 {
    match kernel {
        #[cfg(target_arch = "x86_64")]
        Kernel::Avx2 if avx2_available() => unsafe { relu_dot_avx2(own, opp, w_own, w_opp) },
        #[cfg(target_arch = "x86_64")]
        Kernel::Sse2 => unsafe { relu_dot_sse2(own, opp, w_own, w_opp) },
        #[cfg(target_arch = "aarch64")]
        Kernel::Neon => unsafe { relu_dot_neon(own, opp, w_own, w_opp) },
        _ => relu_dot_scalar(own, opp, w_own, w_opp),
    }
}

// ============================================================================
// Scalar implementation
// ============================================================================

#[inline]
fn relu_dot_scalar(
    own: &[i16; HIDDEN_SIZE],
    opp: &[i16; HIDDEN_SIZE],
    w_own: &[i16; HIDDEN_SIZE],
    w_opp: &[i16; HIDDEN_SIZE],
) -> i32 {
    let mut sum = 0i32;
    for i in 0..HIDDEN_SIZE {
        // max(a, 0) * w fits in i32 for every pair of i16 values
        sum = sum.wrapping_add(i32::from(own[i].max(0)) * i32::from(w_own[i]));
        sum = sum.wrapping_add(i32::from(opp[i].max(0)) * i32::from(w_opp[i]));
    }
    sum
}

// ============================================================================
// SSE2 / AVX2 implementations (x86_64 only)
// ============================================================================

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn relu_dot_sse2(
    own: &[i16; HIDDEN_SIZE],
    opp: &[i16; HIDDEN_SIZE],
    w_own: &[i16; HIDDEN_SIZE],
    w_opp: &[i16; HIDDEN_SIZE],
) -> i32 {
    use std::arch::x86_64::*;

    let zero = _mm_setzero_si128();
    let mut s0 = _mm_setzero_si128();
    let mut s1 = _mm_setzero_si128();

    // Process 8 i16 values at a time (128 bits)
    for i in (0..HIDDEN_SIZE).step_by(8) {
        let a0 = _mm_max_epi16(_mm_loadu_si128(own.as_ptr().add(i) as *const __m128i), zero);
        let a1 = _mm_max_epi16(_mm_loadu_si128(opp.as_ptr().add(i) as *const __m128i), zero);
        let w0 = _mm_loadu_si128(w_own.as_ptr().add(i) as *const __m128i);
        let w1 = _mm_loadu_si128(w_opp.as_ptr().add(i) as *const __m128i);

        // madd: adjacent i16 products summed into i32 lanes
        s0 = _mm_add_epi32(s0, _mm_madd_epi16(a0, w0));
        s1 = _mm_add_epi32(s1, _mm_madd_epi16(a1, w1));
    }

    let r4 = _mm_add_epi32(s0, s1);
    let r2 = _mm_add_epi32(r4, _mm_srli_si128(r4, 8));
    let r1 = _mm_add_epi32(r2, _mm_srli_si128(r2, 4));
    _mm_cvtsi128_si32(r1)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn relu_dot_avx2(
    own: &[i16; HIDDEN_SIZE],
    opp: &[i16; HIDDEN_SIZE],
    w_own: &[i16; HIDDEN_SIZE],
    w_opp: &[i16; HIDDEN_SIZE],
) -> i32 {
    use std::arch::x86_64::*;

    let zero = _mm256_setzero_si256();
    let mut s0 = _mm256_setzero_si256();
    let mut s1 = _mm256_setzero_si256();

    // Process 16 i16 values at a time (256 bits)
    for i in (0..HIDDEN_SIZE).step_by(16) {
        let a0 = _mm256_max_epi16(_mm256_loadu_si256(own.as_ptr().add(i) as *const __m256i), zero);
        let a1 = _mm256_max_epi16(_mm256_loadu_si256(opp.as_ptr().add(i) as *const __m256i), zero);
        let w0 = _mm256_loadu_si256(w_own.as_ptr().add(i) as *const __m256i);
        let w1 = _mm256_loadu_si256(w_opp.as_ptr().add(i) as *const __m256i);

        s0 = _mm256_add_epi32(s0, _mm256_madd_epi16(a0, w0));
        s1 = _mm256_add_epi32(s1, _mm256_madd_epi16(a1, w1));
    }

    let r8 = _mm256_add_epi32(s0, s1);
    let r4 = _mm_add_epi32(_mm256_castsi256_si128(r8), _mm256_extracti128_si256(r8, 1));
    let r2 = _mm_add_epi32(r4, _mm_srli_si128(r4, 8));
    let r1 = _mm_add_epi32(r2, _mm_srli_si128(r2, 4));
    _mm_cvtsi128_si32(r1)
}

// ============================================================================
// NEON implementation (aarch64)
// ============================================================================

#[cfg(target_arch = "aarch64")]
unsafe fn relu_dot_neon(
    own: &[i16; HIDDEN_SIZE],
    opp: &[i16; HIDDEN_SIZE],
    w_own: &[i16; HIDDEN_SIZE],
    w_opp: &[i16; HIDDEN_SIZE],
) -> i32 {
    use std::arch::aarch64::{
        vaddq_s32, vaddvq_s32, vdupq_n_s16, vdupq_n_s32, vget_low_s16, vld1q_s16, vmaxq_s16,
        vmlal_high_s16, vmlal_s16,
    };

    let zero = vdupq_n_s16(0);
    let mut s0 = vdupq_n_s32(0);
    let mut s1 = vdupq_n_s32(0);

    // Process 8 i16 values at a time, widening multiply-accumulate into i32
    for i in (0..HIDDEN_SIZE).step_by(8) {
        let a0 = vmaxq_s16(vld1q_s16(own.as_ptr().add(i)), zero);
        let a1 = vmaxq_s16(vld1q_s16(opp.as_ptr().add(i)), zero);
        let w0 = vld1q_s16(w_own.as_ptr().add(i));
        let w1 = vld1q_s16(w_opp.as_ptr().add(i));

        s0 = vmlal_s16(s0, vget_low_s16(a0), vget_low_s16(w0));
        s0 = vmlal_high_s16(s0, a0, w0);
        s1 = vmlal_s16(s1, vget_low_s16(a1), vget_low_s16(w1));
        s1 = vmlal_high_s16(s1, a1, w1);
    }

    vaddvq_s32(vaddq_s32(s0, s1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn random_lanes(rng: &mut StdRng, lo: i16, hi: i16) -> [i16; HIDDEN_SIZE] {
        std::array::from_fn(|_| rng.gen_range(lo..=hi))
    }

    fn reference_i64(
        own: &[i16; HIDDEN_SIZE],
        opp: &[i16; HIDDEN_SIZE],
        w_own: &[i16; HIDDEN_SIZE],
        w_opp: &[i16; HIDDEN_SIZE],
    ) -> i64 {
        (0..HIDDEN_SIZE)
            .map(|i| {
                i64::from(own[i].max(0)) * i64::from(w_own[i])
                    + i64::from(opp[i].max(0)) * i64::from(w_opp[i])
            })
            .sum()
    }

    #[test]
    fn test_scalar_matches_wide_reference() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..32 {
            let own = random_lanes(&mut rng, -2000, 2000);
            let opp = random_lanes(&mut rng, -2000, 2000);
            let w_own = random_lanes(&mut rng, -300, 300);
            let w_opp = random_lanes(&mut rng, -300, 300);
            let expected = reference_i64(&own, &opp, &w_own, &w_opp);
            assert_eq!(i64::from(relu_dot_scalar(&own, &opp, &w_own, &w_opp)), expected);
        }
    }

    #[test]
    fn test_all_kernels_match_scalar() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..64 {
            let own = random_lanes(&mut rng, i16::MIN, i16::MAX);
            let opp = random_lanes(&mut rng, i16::MIN, i16::MAX);
            let w_own = random_lanes(&mut rng, i16::MIN, i16::MAX);
            let w_opp = random_lanes(&mut rng, i16::MIN, i16::MAX);
            let scalar = relu_dot_scalar(&own, &opp, &w_own, &w_opp);
            for kernel in Kernel::available() {
                assert_eq!(
                    relu_dot(kernel, &own, &opp, &w_own, &w_opp),
                    scalar,
                    "{kernel} diverged from scalar"
                );
            }
        }
    }

    #[test]
    fn test_kernels_agree_on_extremes() {
        let cases = [
            ([i16::MAX; HIDDEN_SIZE], [i16::MIN; HIDDEN_SIZE]),
            ([i16::MAX; HIDDEN_SIZE], [i16::MAX; HIDDEN_SIZE]),
            ([i16::MIN; HIDDEN_SIZE], [i16::MIN; HIDDEN_SIZE]),
            ([0; HIDDEN_SIZE], [-1; HIDDEN_SIZE]),
        ];
        for (acc, weights) in cases {
            let scalar = relu_dot_scalar(&acc, &acc, &weights, &weights);
            for kernel in Kernel::available() {
                assert_eq!(relu_dot(kernel, &acc, &acc, &weights, &weights), scalar);
            }
        }
    }

    #[test]
    fn test_detected_kernel_is_supported() {
        assert!(Kernel::detect().is_supported());
        assert!(Kernel::available().contains(&Kernel::Scalar));
        assert_eq!(Kernel::Avx2.lanes(), 16);
    }

    #[test]
    fn test_unsupported_kernel_falls_back() {
        for kernel in Kernel::ALL {
            assert!(kernel.or_scalar().is_supported());
        }
    }

    #[test]
    fn test_kernel_from_str() {
        assert_eq!("AVX2".parse::<Kernel>(), Ok(Kernel::Avx2));
        assert_eq!(" scalar ".parse::<Kernel>(), Ok(Kernel::Scalar));
        assert!("mmx".parse::<Kernel>().is_err());
    }
}

//! Similarity kernels.
//!
//! Embeddings are stored as `f32`, but every product is widened to `f64`
//! before it is accumulated. Squaring a component near 1e20 overflows `f32`
//! and squaring one near 1e-25 underflows it; neither happens in `f64`, so
//! norms and cosines stay exact in direction for any finite `f32` input.

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

// AVX2 widens 4 lanes at a time; shorter inputs stay scalar
#[cfg(target_arch = "x86_64")]
const AVX_MIN_LEN: usize = 16;

/// Dot product of two equal-length slices, accumulated in `f64`.
///
/// Mismatched lengths yield 0.0; embedding spaces reject them at load.
#[inline]
pub fn dot_f64(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    #[cfg(target_arch = "x86_64")]
    {
        if a.len() >= AVX_MIN_LEN
            && is_x86_feature_detected!("avx2")
            && is_x86_feature_detected!("fma")
        {
            // SAFETY: features checked above, lengths are equal
            return unsafe { dot_f64_avx2(a, b) };
        }
    }

    dot_f64_scalar(a, b)
}

/// Euclidean norm in `f64`; positive for every vector with a non-zero component
#[inline]
pub fn norm_f64(v: &[f32]) -> f64 {
    dot_f64(v, v).sqrt()
}

/// Cosine of two vectors given their norms, `None` when either norm is zero
#[inline]
pub fn cosine_f64(dot: f64, norm_a: f64, norm_b: f64) -> Option<f64> {
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some((dot / norm_a / norm_b).clamp(-1.0, 1.0))
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn dot_f64_avx2(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len();
    let mut acc_lo = _mm256_setzero_pd();
    let mut acc_hi = _mm256_setzero_pd();
    let mut i = 0;

    while i + 8 <= len {
        let xa = _mm256_loadu_ps(a.as_ptr().add(i));
        let xb = _mm256_loadu_ps(b.as_ptr().add(i));
        let a_lo = _mm256_cvtps_pd(_mm256_castps256_ps128(xa));
        let b_lo = _mm256_cvtps_pd(_mm256_castps256_ps128(xb));
        let a_hi = _mm256_cvtps_pd(_mm256_extractf128_ps(xa, 1));
        let b_hi = _mm256_cvtps_pd(_mm256_extractf128_ps(xb, 1));
        acc_lo = _mm256_fmadd_pd(a_lo, b_lo, acc_lo);
        acc_hi = _mm256_fmadd_pd(a_hi, b_hi, acc_hi);
        i += 8;
    }

    let acc = _mm256_add_pd(acc_lo, acc_hi);
    let pair = _mm_add_pd(_mm256_castpd256_pd128(acc), _mm256_extractf128_pd(acc, 1));
    let mut dot = _mm_cvtsd_f64(_mm_add_sd(pair, _mm_unpackhi_pd(pair, pair)));

    for (&x, &y) in a[i..].iter().zip(&b[i..]) {
        dot += f64::from(x) * f64::from(y);
    }
    dot
}

fn dot_f64_scalar(a: &[f32], b: &[f32]) -> f64 {
    let mut lanes = [0.0f64; 4];
    let a_chunks = a.chunks_exact(4);
    let b_chunks = b.chunks_exact(4);
    let tail = a_chunks.remainder().iter().zip(b_chunks.remainder());

    for (ca, cb) in a_chunks.zip(b_chunks) {
        for (lane, (&x, &y)) in lanes.iter_mut().zip(ca.iter().zip(cb)) {
            *lane += f64::from(x) * f64::from(y);
        }
    }

    let tail: f64 = tail.map(|(&x, &y)| f64::from(x) * f64::from(y)).sum();
    lanes.iter().sum::<f64>() + tail
}

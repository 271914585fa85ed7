use serde::{Deserialize, Serialize};

/// A dense embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn from_slice(data: &[f32]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Euclidean norm, accumulated in `f64`
    #[inline]
    pub fn norm(&self) -> f64 {
        crate::simd::norm_f64(&self.data)
    }

    #[inline]
    pub fn dot(&self, other: &Vector) -> f64 {
        crate::simd::dot_f64(&self.data, &other.data)
    }

    /// True when every component is exactly zero (the direction is undefined)
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|&x| x == 0.0)
    }

    /// Cosine similarity with another vector.
    ///
    /// Returns `None` when either vector is all zeros (the similarity is
    /// undefined) or the dimensions differ.
    #[inline]
    pub fn cosine_similarity(&self, other: &Vector) -> Option<f32> {
        if self.dim() != other.dim() || self.is_zero() || other.is_zero() {
            return None;
        }
        crate::simd::cosine_f64(self.dot(other), self.norm(), other.norm()).map(|c| c as f32)
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Vector::new(data)
    }
}

//! Feature matching between detected people and the suspect.

use recon_models::FeatureVector;

use crate::error::{TrackerResult, TrackingError};

/// Cosine similarity of two L2-normalized feature vectors, clamped to [0, 1].
///
/// Fails with `InvalidArgument` when the lengths differ or either vector is
/// empty, all-zero or non-finite.
pub fn similarity(a: &FeatureVector, b: &FeatureVector) -> TrackerResult<f64> {
    if a.len() != b.len() {
        return Err(TrackingError::invalid_argument(format!(
            "feature vector lengths differ ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    let norm_a = usable_norm(a)?;
    let norm_b = usable_norm(b)?;

    let dot: f64 = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (f64::from(*x) / norm_a) * (f64::from(*y) / norm_b))
        .sum();

    if !dot.is_finite() {
        return Err(TrackingError::invalid_argument("similarity is not finite"));
    }
    Ok(dot.clamp(0.0, 1.0))
}

fn usable_norm(v: &FeatureVector) -> TrackerResult<f64> {
    if v.is_empty() {
        return Err(TrackingError::invalid_argument("empty feature vector"));
    }
    let norm = v.norm();
    if !norm.is_finite() || norm <= 0.0 {
        return Err(TrackingError::invalid_argument(
            "feature vector has zero or non-finite norm",
        ));
    }
    Ok(norm)
}

/// Match confidence on the 0-100 scale.
pub fn confidence(similarity: f64) -> f64 {
    similarity * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: &[f32]) -> FeatureVector {
        FeatureVector::new(values.to_vec())
    }

    #[test]
    fn test_reflexive_and_symmetric() {
        let samples = [
            v(&[0.3, -1.2, 4.0, 0.01]),
            v(&[1.0, 1.0, 1.0, 1.0]),
            v(&[1e-3, 2e-3, 0.0, 5e-4]),
            v(&[1e6, -3e5, 2e5, 7.0]),
        ];
        for a in &samples {
            assert!((similarity(a, a).unwrap() - 1.0).abs() < 1e-9);
            for b in &samples {
                assert_eq!(similarity(a, b).unwrap(), similarity(b, a).unwrap());
            }
        }
    }

    #[test]
    fn test_scale_invariant() {
        let a = v(&[1.0, 2.0, 3.0]);
        let b = v(&[10.0, 20.0, 30.0]);
        assert!((similarity(&a, &b).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_opposite_vectors_clamp_to_zero() {
        let a = v(&[1.0, 0.0]);
        let b = v(&[-1.0, 0.0]);
        assert_eq!(similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_known_angle() {
        let a = v(&[1.0, 0.0]);
        let b = v(&[0.6, 0.8]);
        assert!((similarity(&a, &b).unwrap() - 0.6).abs() < 1e-6);
        assert!((confidence(0.85) - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_inputs() {
        let a = v(&[1.0, 0.0]);
        assert!(matches!(
            similarity(&a, &v(&[1.0, 0.0, 0.0])),
            Err(TrackingError::InvalidArgument(_))
        ));
        assert!(similarity(&a, &v(&[0.0, 0.0])).is_err());
        assert!(similarity(&v(&[]), &v(&[])).is_err());
        assert!(similarity(&a, &v(&[f32::NAN, 1.0])).is_err());
    }
}

use crate::rag::RagError;

/// Allowed deviation of ‖v‖₂ from 1 for a vector to count as unit length.
pub const UNIT_NORM_TOLERANCE: f32 = 1e-5;

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter()
        .map(|x| (*x as f64) * (*x as f64))
        .sum::<f64>()
        .sqrt() as f32
}

pub fn is_unit(v: &[f32]) -> bool {
    (l2_norm(v) - 1.0).abs() <= UNIT_NORM_TOLERANCE
}

/// Scale `v` to unit length in place.
pub fn l2_normalize(v: &mut [f32]) -> Result<(), RagError> {
    if v.is_empty() {
        return Err(RagError::InvalidInput(
            "cannot normalize an empty vector".to_string(),
        ));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(RagError::InvalidInput(
            "vector contains non-finite values".to_string(),
        ));
    }

    let norm = v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm <= f64::from(f32::EPSILON) {
        return Err(RagError::InvalidInput(
            "cannot normalize a zero vector".to_string(),
        ));
    }

    for x in v.iter_mut() {
        *x = (*x as f64 / norm) as f32;
    }
    Ok(())
}

use std::mem;

const F32_BYTES: usize = mem::size_of::<f32>();

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum VectorError {
	#[error("Vector is empty.")]
	Empty,
	#[error("Vector has {actual} values but declares dimension {declared}.")]
	DimensionMismatch { declared: usize, actual: usize },
	#[error("Vector value at index {index} is not finite.")]
	NonFinite { index: usize },
	#[error("Vector has zero norm.")]
	ZeroNorm,
}

/// Cosine similarity over the common prefix of `lhs` and `rhs`.
///
/// Returns `0.0` when either side has zero norm so scoring stays total.
pub fn cosine(lhs: &[f32], rhs: &[f32]) -> f64 {
	let mut dot = 0.0_f64;
	let mut lhs_norm = 0.0_f64;
	let mut rhs_norm = 0.0_f64;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		let l = f64::from(*l);
		let r = f64::from(*r);

		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm == 0.0 || rhs_norm == 0.0 {
		return 0.0;
	}

	(dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0)
}

pub fn encode_vector(vec: &[f32]) -> Vec<u8> {
	let mut bytes = Vec::with_capacity(mem::size_of_val(vec));

	for value in vec {
		bytes.extend_from_slice(&value.to_le_bytes());
	}

	bytes
}

/// Decodes little-endian packed `f32` values. Trailing bytes that do not form a whole value are
/// ignored.
pub fn decode_vector(bytes: &[u8]) -> Vec<f32> {
	bytes
		.chunks_exact(F32_BYTES)
		.map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
		.collect()
}

pub fn validate_vector(vec: &[f32], declared_dim: usize) -> Result<(), VectorError> {
	if vec.is_empty() {
		return Err(VectorError::Empty);
	}
	if vec.len() != declared_dim {
		return Err(VectorError::DimensionMismatch { declared: declared_dim, actual: vec.len() });
	}
	if let Some(index) = vec.iter().position(|value| !value.is_finite()) {
		return Err(VectorError::NonFinite { index });
	}
	if vec.iter().all(|value| *value == 0.0) {
		return Err(VectorError::ZeroNorm);
	}

	Ok(())
}

// DSP utilities - Output hygiene for the click mix

/// Flush denormals to zero
///
/// Denormal floats (very close to 0) can cause heavy CPU slowdowns on some
/// processors. Threshold: 1e-15, far below 32-bit float noise.
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft clipping with tanh
///
/// Overlapping clicks can sum above 1.0; tanh keeps the output in [-1, 1]
/// while staying near-linear for normal levels.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Final per-sample conditioning before conversion to the device format
#[inline]
pub fn condition(x: f32) -> f32 {
    soft_clip(flush_denormals_to_zero(x))
}

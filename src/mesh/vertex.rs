//! Values that can fill one field of a vertex record.
//!
//! Staging sequences hold 32-bit components as `f32`. Integer fields keep
//! their exact bit pattern, so the bytes sent to the GPU match the signed
//! integer vertex formats.

use glam::{IVec2, IVec3, IVec4, Mat3, Mat4, Vec2, Vec3, Vec4};

/// A scalar, vector, matrix or boolean that can be written into a field.
pub trait VertexValue: Sized {
    /// Number of 32-bit components written.
    const COMPONENTS: usize;

    /// Write the components in order. `out.len() == Self::COMPONENTS`.
    fn write(&self, out: &mut [f32]);

    /// Read a value back. `components.len() == Self::COMPONENTS`.
    fn read(components: &[f32]) -> Self;
}

impl VertexValue for f32 {
    const COMPONENTS: usize = 1;

    fn write(&self, out: &mut [f32]) {
        out[0] = *self;
    }

    fn read(components: &[f32]) -> Self {
        components[0]
    }
}

impl<const N: usize> VertexValue for [f32; N] {
    const COMPONENTS: usize = N;

    fn write(&self, out: &mut [f32]) {
        out.copy_from_slice(self);
    }

    fn read(components: &[f32]) -> Self {
        let mut value = [0.0; N];
        value.copy_from_slice(components);
        value
    }
}

macro_rules! impl_float_vector {
    ($ty:ty, $n:literal) => {
        impl VertexValue for $ty {
            const COMPONENTS: usize = $n;

            fn write(&self, out: &mut [f32]) {
                out.copy_from_slice(&self.to_array());
            }

            fn read(components: &[f32]) -> Self {
                <$ty>::from_slice(components)
            }
        }
    };
}

impl_float_vector!(Vec2, 2);
impl_float_vector!(Vec3, 3);
impl_float_vector!(Vec4, 4);

impl VertexValue for bool {
    const COMPONENTS: usize = 1;

    fn write(&self, out: &mut [f32]) {
        out[0] = if *self { 1.0 } else { 0.0 };
    }

    fn read(components: &[f32]) -> Self {
        components[0] != 0.0
    }
}

impl VertexValue for i32 {
    const COMPONENTS: usize = 1;

    fn write(&self, out: &mut [f32]) {
        out[0] = f32::from_bits(*self as u32);
    }

    fn read(components: &[f32]) -> Self {
        components[0].to_bits() as i32
    }
}

macro_rules! impl_int_vector {
    ($ty:ty, $n:literal) => {
        impl VertexValue for $ty {
            const COMPONENTS: usize = $n;

            fn write(&self, out: &mut [f32]) {
                for (dst, src) in out.iter_mut().zip(self.to_array()) {
                    *dst = f32::from_bits(src as u32);
                }
            }

            fn read(components: &[f32]) -> Self {
                let mut value = [0i32; $n];
                for (dst, src) in value.iter_mut().zip(components) {
                    *dst = src.to_bits() as i32;
                }
                <$ty>::from_array(value)
            }
        }
    };
}

impl_int_vector!(IVec2, 2);
impl_int_vector!(IVec3, 3);
impl_int_vector!(IVec4, 4);

impl VertexValue for Mat3 {
    const COMPONENTS: usize = 9;

    fn write(&self, out: &mut [f32]) {
        out.copy_from_slice(&self.to_cols_array());
    }

    fn read(components: &[f32]) -> Self {
        Mat3::from_cols_slice(components)
    }
}

impl VertexValue for Mat4 {
    const COMPONENTS: usize = 16;

    fn write(&self, out: &mut [f32]) {
        out.copy_from_slice(&self.to_cols_array());
    }

    fn read(components: &[f32]) -> Self {
        Mat4::from_cols_slice(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: VertexValue>(value: &T) -> T {
        let mut buf = vec![0.0; T::COMPONENTS];
        value.write(&mut buf);
        T::read(&buf)
    }

    #[test]
    fn test_float_values_are_bit_exact() {
        let v = Vec3::new(0.1, -2.5e-7, f32::MAX);
        let back = round_trip(&v);
        assert_eq!(back.x.to_bits(), v.x.to_bits());
        assert_eq!(back.y.to_bits(), v.y.to_bits());
        assert_eq!(back.z.to_bits(), v.z.to_bits());
    }

    #[test]
    fn test_integers_keep_bit_pattern() {
        let v = IVec3::new(-1, 0, i32::MAX);
        let mut buf = [0.0f32; 3];
        v.write(&mut buf);
        assert_eq!(bytemuck::cast_slice::<f32, i32>(&buf), &[-1, 0, i32::MAX]);
        assert_eq!(IVec3::read(&buf), v);
    }

    #[test]
    fn test_matrix_is_column_major() {
        let m = Mat3::from_cols(Vec3::X, Vec3::Y * 2.0, Vec3::new(1.0, 2.0, 3.0));
        let mut buf = [0.0f32; 9];
        m.write(&mut buf);
        assert_eq!(buf, [1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(round_trip(&Mat4::IDENTITY), Mat4::IDENTITY);
    }

    #[test]
    fn test_bool_maps_to_unit_float() {
        let mut buf = [0.5f32];
        true.write(&mut buf);
        assert_eq!(buf[0], 1.0);
        assert!(!bool::read(&[0.0]));
        assert_eq!(<[f32; 2]>::COMPONENTS, 2);
    }
}

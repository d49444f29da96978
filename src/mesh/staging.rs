//! Host-side staging sequences for vertex buffer slots.
//!
//! A slot is filled either field by field ([`FieldStaging`]) or in whole
//! records ([`RawStaging`]). The first append picks the mode and the slot keeps
//! it until it is cleared, so the two protocols never share a counter.

use std::fmt;

use crate::error::{MeshError, MeshResult};
use crate::mesh::layout::AttributeLayout;
use crate::mesh::vertex::VertexValue;

/// How a slot's staging sequence is being filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendMode {
    Field,
    Raw,
}

impl fmt::Display for AppendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppendMode::Field => write!(f, "field"),
            AppendMode::Raw => write!(f, "raw"),
        }
    }
}

/// Accumulates one field at a time and knows which field comes next.
#[derive(Debug, Clone, Default)]
pub struct FieldStaging {
    data: Vec<f32>,
    next_field: usize,
}

impl FieldStaging {
    /// Append `value` as the next field of the current record.
    ///
    /// Returns `true` when this field completed the record.
    pub fn push<T: VertexValue>(
        &mut self,
        layout: &AttributeLayout,
        slot: usize,
        value: &T,
    ) -> MeshResult<bool> {
        let element = layout
            .element(self.next_field)
            .ok_or(MeshError::IndexOutOfRange {
                index: self.next_field,
                len: layout.field_count(),
            })?;
        if element.component_count() != T::COMPONENTS {
            return Err(MeshError::FieldMismatch {
                slot,
                field: self.next_field,
                name: element.name().to_string(),
                expected: element.component_count(),
                found: T::COMPONENTS,
            });
        }

        let start = self.data.len();
        self.data.resize(start + T::COMPONENTS, 0.0);
        value.write(&mut self.data[start..]);

        self.next_field += 1;
        if self.next_field == layout.field_count() {
            self.next_field = 0;
            return Ok(true);
        }
        Ok(false)
    }

    /// Fields written into the record that is still open.
    pub fn pending_fields(&self) -> usize {
        self.next_field
    }
}

/// Accumulates pre-interleaved records.
#[derive(Debug, Clone, Default)]
pub struct RawStaging {
    data: Vec<f32>,
}

impl RawStaging {
    /// Append whole records, returning how many were added.
    pub fn extend(&mut self, layout: &AttributeLayout, values: &[f32]) -> MeshResult<usize> {
        let per_record = layout.component_count();
        if values.len() % per_record != 0 {
            return Err(MeshError::PartialRecord {
                len: values.len(),
                record: per_record,
            });
        }
        self.data.extend_from_slice(values);
        Ok(values.len() / per_record)
    }
}

fn conflict(slot: usize, current: Option<AppendMode>, requested: AppendMode) -> MeshError {
    MeshError::MixedAppendModes {
        slot,
        current: current.unwrap_or(requested),
        requested,
    }
}

/// Staging sequence of one slot.
///
/// `Empty` holds no values but keeps any capacity reserved or left behind by
/// [`Staging::clear`], which moves into whichever mode is picked next.
#[derive(Debug, Clone)]
pub enum Staging {
    Empty(Vec<f32>),
    Fields(FieldStaging),
    Raw(RawStaging),
}

impl Default for Staging {
    fn default() -> Self {
        Staging::Empty(Vec::new())
    }
}

impl Staging {
    pub fn mode(&self) -> Option<AppendMode> {
        match self {
            Staging::Empty(_) => None,
            Staging::Fields(_) => Some(AppendMode::Field),
            Staging::Raw(_) => Some(AppendMode::Raw),
        }
    }

    /// Field accumulator of this slot, selecting field mode if still empty.
    pub fn fields(&mut self, slot: usize) -> MeshResult<&mut FieldStaging> {
        if let Staging::Empty(spare) = self {
            let data = std::mem::take(spare);
            *self = Staging::Fields(FieldStaging { data, next_field: 0 });
        }
        let current = self.mode();
        match self {
            Staging::Fields(fields) => Ok(fields),
            _ => Err(conflict(slot, current, AppendMode::Field)),
        }
    }

    /// Raw accumulator of this slot, selecting raw mode if still empty.
    pub fn raw(&mut self, slot: usize) -> MeshResult<&mut RawStaging> {
        if let Staging::Empty(spare) = self {
            let data = std::mem::take(spare);
            *self = Staging::Raw(RawStaging { data });
        }
        let current = self.mode();
        match self {
            Staging::Raw(raw) => Ok(raw),
            _ => Err(conflict(slot, current, AppendMode::Raw)),
        }
    }

    /// Push one field. A rejected first field leaves the slot without a mode.
    pub fn push_field<T: VertexValue>(
        &mut self,
        layout: &AttributeLayout,
        slot: usize,
        value: &T,
    ) -> MeshResult<bool> {
        let result = self.fields(slot)?.push(layout, slot, value);
        if result.is_err() {
            self.release_mode();
        }
        result
    }

    /// Append whole records. A rejected first block leaves the slot without a mode.
    pub fn extend_raw(
        &mut self,
        layout: &AttributeLayout,
        slot: usize,
        values: &[f32],
    ) -> MeshResult<usize> {
        let result = self.raw(slot)?.extend(layout, values);
        if result.is_err() {
            self.release_mode();
        }
        result
    }

    /// Fall back to `Empty` if nothing has been staged under the current mode.
    fn release_mode(&mut self) {
        if self.mode().is_some() && self.is_empty() {
            self.clear();
        }
    }

    /// Reserve room for at least `additional` more components.
    pub fn reserve(&mut self, additional: usize) {
        match self {
            Staging::Empty(spare) => spare.reserve(additional),
            Staging::Fields(fields) => fields.data.reserve(additional),
            Staging::Raw(raw) => raw.data.reserve(additional),
        }
    }

    /// Components the slot can hold before reallocating.
    pub fn capacity(&self) -> usize {
        match self {
            Staging::Empty(spare) => spare.capacity(),
            Staging::Fields(fields) => fields.data.capacity(),
            Staging::Raw(raw) => raw.data.capacity(),
        }
    }

    pub fn data(&self) -> &[f32] {
        match self {
            Staging::Empty(_) => &[],
            Staging::Fields(fields) => &fields.data,
            Staging::Raw(raw) => &raw.data,
        }
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        match self {
            Staging::Empty(_) => &mut [],
            Staging::Fields(fields) => &mut fields.data,
            Staging::Raw(raw) => &mut raw.data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Number of complete records staged.
    pub fn record_count(&self, layout: &AttributeLayout) -> usize {
        self.data().len() / layout.component_count()
    }

    /// Drop all staged data and forget the append mode. Capacity is kept.
    pub fn clear(&mut self) {
        let mut data = match std::mem::take(self) {
            Staging::Empty(spare) => spare,
            Staging::Fields(fields) => fields.data,
            Staging::Raw(raw) => raw.data,
        };
        data.clear();
        *self = Staging::Empty(data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::layout::{LayoutElement, ShaderDataType};
    use glam::{Vec2, Vec3};

    fn pos_uv() -> AttributeLayout {
        AttributeLayout::new([
            LayoutElement::new(ShaderDataType::Float3, "position"),
            LayoutElement::new(ShaderDataType::Float2, "uv"),
        ])
        .unwrap()
    }

    #[test]
    fn test_field_push_completes_record_on_last_field() {
        let layout = pos_uv();
        let mut staging = Staging::default();

        let fields = staging.fields(0).unwrap();
        assert!(!fields.push(&layout, 0, &Vec3::ONE).unwrap());
        assert_eq!(fields.pending_fields(), 1);
        assert!(fields.push(&layout, 0, &Vec2::ZERO).unwrap());
        assert_eq!(fields.pending_fields(), 0);

        assert_eq!(staging.data().len(), 5);
        assert_eq!(staging.record_count(&layout), 1);
    }

    #[test]
    fn test_field_push_checks_component_count() {
        let layout = pos_uv();
        let mut staging = Staging::default();

        let err = staging.push_field(&layout, 2, &Vec2::ONE);
        assert!(matches!(
            err,
            Err(MeshError::FieldMismatch { slot: 2, field: 0, expected: 3, found: 2, .. })
        ));
        assert!(staging.is_empty());
        assert_eq!(staging.mode(), None);

        assert_eq!(staging.extend_raw(&layout, 2, &[0.0; 5]).unwrap(), 1);
        assert_eq!(staging.mode(), Some(AppendMode::Raw));
    }

    #[test]
    fn test_rejected_first_raw_block_keeps_slot_open() {
        let layout = pos_uv();
        let mut staging = Staging::default();

        let err = staging.extend_raw(&layout, 0, &[0.5]);
        assert!(matches!(err, Err(MeshError::PartialRecord { len: 1, record: 5 })));
        assert_eq!(staging.mode(), None);

        assert!(!staging.push_field(&layout, 0, &Vec3::ONE).unwrap());
        assert_eq!(staging.mode(), Some(AppendMode::Field));
    }

    #[test]
    fn test_later_rejection_keeps_mode() {
        let layout = pos_uv();
        let mut staging = Staging::default();
        staging.push_field(&layout, 0, &Vec3::ONE).unwrap();

        assert!(staging.push_field(&layout, 0, &Vec3::ONE).is_err());
        assert_eq!(staging.mode(), Some(AppendMode::Field));
        assert_eq!(staging.data().len(), 3);
    }

    #[test]
    fn test_reserved_capacity_survives_mode_choice_and_clear() {
        let layout = pos_uv();
        let mut staging = Staging::default();

        staging.reserve(50);
        assert!(staging.capacity() >= 50);
        staging.extend_raw(&layout, 0, &[1.0; 10]).unwrap();
        assert!(staging.capacity() >= 50);

        staging.clear();
        assert_eq!(staging.mode(), None);
        assert!(staging.is_empty());
        assert!(staging.capacity() >= 50);
    }

    #[test]
    fn test_raw_extend_requires_whole_records() {
        let layout = pos_uv();
        let mut staging = Staging::default();

        let added = staging.raw(0).unwrap().extend(&layout, &[0.0; 10]).unwrap();
        assert_eq!(added, 2);

        let err = staging.raw(0).unwrap().extend(&layout, &[0.0; 4]);
        assert!(matches!(err, Err(MeshError::PartialRecord { len: 4, record: 5 })));
        assert_eq!(staging.data().len(), 10);
    }

    #[test]
    fn test_modes_cannot_be_mixed_until_cleared() {
        let layout = pos_uv();
        let mut staging = Staging::default();
        staging.raw(1).unwrap().extend(&layout, &[0.0; 5]).unwrap();

        assert!(matches!(
            staging.fields(1),
            Err(MeshError::MixedAppendModes {
                slot: 1,
                current: AppendMode::Raw,
                requested: AppendMode::Field
            })
        ));

        staging.clear();
        assert_eq!(staging.mode(), None);
        assert!(staging.fields(1).is_ok());
        assert_eq!(staging.mode(), Some(AppendMode::Field));
    }
}

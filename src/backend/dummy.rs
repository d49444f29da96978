//! Dummy GPU backend for testing and development.
//!
//! This backend performs no GPU work. It keeps a host copy of every buffer and
//! records each draw so tests can inspect exactly what a mesh would have sent
//! to the device.

use std::collections::HashMap;
use std::ops::Range;

use crate::backend::traits::*;
use crate::backend::types::*;

/// Host-side stand-in for a device buffer
#[derive(Debug, Clone)]
struct DummyBuffer {
    label: Option<String>,
    usage: BufferUsage,
    data: Vec<u8>,
    capacity: u64,
    uploads: u32,
    reallocations: u32,
}

/// A draw call captured by the dummy backend
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub program: ProgramHandle,
    pub uniforms: Vec<u8>,
    pub topology: PrimitiveTopology,
    pub range: DrawRange,
    pub input: VertexInput,
}

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    width: u32,
    height: u32,
    buffers: HashMap<u64, DummyBuffer>,
    programs: HashMap<u64, ProgramDescriptor>,
    next_buffer_id: u64,
    next_program_id: u64,
    in_frame: bool,
    current_program: Option<(ProgramHandle, Vec<u8>)>,
    clear_color: [f32; 4],
    draws: Vec<RecordedDraw>,
    frames_presented: u64,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::with_surface_size(800, 800)
    }

    pub fn with_surface_size(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_buffer_id: 1,
            next_program_id: 1,
            ..Default::default()
        }
    }

    /// Bytes of the last upload to `buffer`
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(&buffer.0).map(|b| b.data.as_slice())
    }

    /// Number of uploads performed on `buffer`
    pub fn upload_count(&self, buffer: BufferHandle) -> u32 {
        self.buffers.get(&buffer.0).map_or(0, |b| b.uploads)
    }

    /// Number of times `buffer` had to grow
    pub fn reallocation_count(&self, buffer: BufferHandle) -> u32 {
        self.buffers.get(&buffer.0).map_or(0, |b| b.reallocations)
    }

    pub fn buffer_label(&self, buffer: BufferHandle) -> Option<&str> {
        self.buffers.get(&buffer.0).and_then(|b| b.label.as_deref())
    }

    pub fn is_live(&self, buffer: BufferHandle) -> bool {
        self.buffers.contains_key(&buffer.0)
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.programs.len()
    }

    /// Draws recorded since the last [`DummyBackend::take_draws`]
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    pub fn take_draws(&mut self) -> Vec<RecordedDraw> {
        std::mem::take(&mut self.draws)
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    fn check_buffer(&self, buffer: BufferHandle, usage: BufferUsage) -> BackendResult<()> {
        let buf = self
            .buffers
            .get(&buffer.0)
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        if !buf.usage.contains(usage) {
            return Err(BackendError::InvalidUsage { buffer, usage });
        }
        Ok(())
    }

    fn record(
        &mut self,
        input: &VertexInput,
        topology: PrimitiveTopology,
        range: DrawRange,
    ) -> BackendResult<()> {
        if !self.in_frame {
            return Err(BackendError::NoActiveFrame);
        }
        let (program, uniforms) = self
            .current_program
            .clone()
            .ok_or(BackendError::NoProgramBound)?;
        for &buffer in &input.buffers {
            self.check_buffer(buffer, BufferUsage::VERTEX)?;
        }
        if let DrawRange::Indices(_) = range {
            let index_buffer = input.index_buffer.ok_or(BackendError::MissingIndexBuffer)?;
            self.check_buffer(index_buffer, BufferUsage::INDEX)?;
        }
        log::trace!("DummyBackend: draw {:?} as {:?}", range, topology);
        self.draws.push(RecordedDraw {
            program,
            uniforms,
            topology,
            range,
            input: input.clone(),
        });
        Ok(())
    }
}

impl GraphicsBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.width = width;
            self.height = height;
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_frame(&mut self, clear_color: [f32; 4]) -> BackendResult<FrameContext> {
        self.in_frame = true;
        self.clear_color = clear_color;
        Ok(FrameContext {
            width: self.width,
            height: self.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        self.in_frame = false;
        self.current_program = None;
        self.frames_presented += 1;
        Ok(())
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferHandle> {
        log::trace!(
            "DummyBackend: creating buffer {:?} (size: {})",
            desc.label,
            desc.size
        );
        let id = self.next_buffer_id;
        self.next_buffer_id += 1;
        self.buffers.insert(
            id,
            DummyBuffer {
                label: desc.label.clone(),
                usage: desc.usage,
                data: Vec::new(),
                capacity: desc.size,
                uploads: 0,
                reallocations: 0,
            },
        );
        Ok(BufferHandle(id))
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> BackendResult<()> {
        let buf = self
            .buffers
            .get_mut(&buffer.0)
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        if data.len() as u64 > buf.capacity {
            buf.capacity = data.len() as u64;
            buf.reallocations += 1;
        }
        buf.data.clear();
        buf.data.extend_from_slice(data);
        buf.uploads += 1;
        Ok(())
    }

    fn buffer_size(&self, buffer: BufferHandle) -> Option<u64> {
        self.buffers.get(&buffer.0).map(|b| b.data.len() as u64)
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer.0);
    }

    fn create_program(&mut self, desc: &ProgramDescriptor) -> BackendResult<ProgramHandle> {
        let id = self.next_program_id;
        self.next_program_id += 1;
        self.programs.insert(id, desc.clone());
        Ok(ProgramHandle(id))
    }

    fn destroy_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program.0);
    }

    fn use_program(&mut self, program: ProgramHandle, uniforms: &[u8]) -> BackendResult<()> {
        if !self.programs.contains_key(&program.0) {
            return Err(BackendError::UnknownProgram(program));
        }
        self.current_program = Some((program, uniforms.to_vec()));
        Ok(())
    }

    fn draw(
        &mut self,
        input: &VertexInput,
        topology: PrimitiveTopology,
        vertices: Range<u32>,
    ) -> BackendResult<()> {
        self.record(input, topology, DrawRange::Vertices(vertices))
    }

    fn draw_indexed(
        &mut self,
        input: &VertexInput,
        topology: PrimitiveTopology,
        indices: Range<u32>,
    ) -> BackendResult<()> {
        self.record(input, topology, DrawRange::Indices(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_grows_under_same_handle() {
        let mut backend = DummyBackend::new();
        let buffer = backend
            .create_buffer(&BufferDescriptor::vertex("grow"))
            .unwrap();

        backend.upload_buffer(buffer, &[1, 2, 3, 4]).unwrap();
        backend.upload_buffer(buffer, &[5, 6]).unwrap();
        backend.upload_buffer(buffer, &[0; 16]).unwrap();

        assert_eq!(backend.upload_count(buffer), 3);
        assert_eq!(backend.reallocation_count(buffer), 2);
        assert_eq!(backend.buffer_size(buffer), Some(16));
    }

    #[test]
    fn test_destroyed_buffer_is_unknown() {
        let mut backend = DummyBackend::new();
        let buffer = backend
            .create_buffer(&BufferDescriptor::index("gone"))
            .unwrap();
        backend.destroy_buffer(buffer);

        assert!(!backend.is_live(buffer));
        assert!(matches!(
            backend.upload_buffer(buffer, &[0; 4]),
            Err(BackendError::UnknownBuffer(_))
        ));
    }

    #[test]
    fn test_draw_requires_frame_and_program() {
        let mut backend = DummyBackend::new();
        let input = VertexInput::default();

        assert!(matches!(
            backend.draw(&input, PrimitiveTopology::TriangleList, 0..3),
            Err(BackendError::NoActiveFrame)
        ));

        backend.begin_frame([0.0; 4]).unwrap();
        assert!(matches!(
            backend.draw(&input, PrimitiveTopology::TriangleList, 0..3),
            Err(BackendError::NoProgramBound)
        ));
    }

    #[test]
    fn test_uniforms_are_snapshotted_per_draw() {
        let mut backend = DummyBackend::new();
        let program = backend
            .create_program(&ProgramDescriptor {
                label: None,
                source: String::new(),
                uniform_size: 4,
            })
            .unwrap();
        let input = VertexInput::default();

        backend.begin_frame([0.25, 0.25, 0.25, 1.0]).unwrap();
        backend.use_program(program, &[1, 0, 0, 0]).unwrap();
        backend.draw(&input, PrimitiveTopology::TriangleList, 0..3).unwrap();
        backend.use_program(program, &[2, 0, 0, 0]).unwrap();
        backend.draw(&input, PrimitiveTopology::TriangleStrip, 0..4).unwrap();
        backend.end_frame().unwrap();

        let draws = backend.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].uniforms, vec![1, 0, 0, 0]);
        assert_eq!(draws[1].uniforms, vec![2, 0, 0, 0]);
        assert_eq!(draws[1].range, DrawRange::Vertices(0..4));
        assert_eq!(backend.frames_presented(), 1);
    }
}

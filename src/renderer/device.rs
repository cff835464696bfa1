use crate::error::{PlotError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Vertex,
    Index,
    Uniform,
    Storage,
}

/// The slice of a graphics device the resource layer needs: create a buffer once,
/// rewrite its contents later.
pub trait GraphicsDevice {
    type Buffer;

    fn create_buffer(&self, label: &str, kind: BufferKind, size: u64) -> Result<Self::Buffer>;

    /// Queues a write; visible to every draw submitted after it.
    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]);
}

pub struct WgpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl WgpuContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

impl GraphicsDevice for WgpuContext {
    type Buffer = wgpu::Buffer;

    fn create_buffer(&self, label: &str, kind: BufferKind, size: u64) -> Result<wgpu::Buffer> {
        let limits = self.device.limits();
        let max = match kind {
            BufferKind::Uniform => limits.max_uniform_buffer_binding_size as u64,
            BufferKind::Storage => limits.max_storage_buffer_binding_size as u64,
            BufferKind::Vertex | BufferKind::Index => limits.max_buffer_size,
        };
        if size == 0 || size > max {
            return Err(PlotError::DeviceResourceCreationFailed {
                label: label.to_string(),
                reason: format!("size {} outside 1..={}", size, max),
            });
        }

        let usage = match kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
            BufferKind::Uniform => wgpu::BufferUsages::UNIFORM,
            BufferKind::Storage => wgpu::BufferUsages::STORAGE,
        } | wgpu::BufferUsages::COPY_DST;

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT),
            usage,
            mapped_at_creation: false,
        });

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());
        if let Some(err) = validation.or(out_of_memory) {
            return Err(PlotError::DeviceResourceCreationFailed {
                label: label.to_string(),
                reason: err.to_string(),
            });
        }

        log::debug!("allocated {label}: {size} bytes ({kind:?})");
        Ok(buffer)
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, offset: u64, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.queue.write_buffer(buffer, offset, data);
    }
}

#[cfg(test)]
pub mod recording {
    use std::cell::{Cell, RefCell};

    use super::*;

    pub struct RecordedBuffer {
        pub label: String,
        pub kind: BufferKind,
        pub data: Vec<u8>,
    }

    /// In-memory device that keeps every buffer's bytes for inspection.
    #[derive(Default)]
    pub struct RecordingDevice {
        pub buffers: RefCell<Vec<RecordedBuffer>>,
        pub writes: Cell<usize>,
        pub max_buffer_size: Option<u64>,
    }

    impl RecordingDevice {
        pub fn with_max_buffer_size(max: u64) -> Self {
            Self {
                max_buffer_size: Some(max),
                ..Default::default()
            }
        }

        pub fn size(&self, id: usize) -> usize {
            self.buffers.borrow()[id].data.len()
        }

        pub fn bytes(&self, id: usize) -> Vec<u8> {
            self.buffers.borrow()[id].data.clone()
        }

        pub fn floats(&self, id: usize, count: usize) -> Vec<f32> {
            bytemuck::cast_slice::<u8, f32>(&self.bytes(id)[..count * 4]).to_vec()
        }

        pub fn allocations(&self) -> usize {
            self.buffers.borrow().len()
        }

        pub fn find(&self, label: &str) -> usize {
            self.buffers
                .borrow()
                .iter()
                .position(|b| b.label == label)
                .unwrap_or_else(|| panic!("no buffer labelled {label}"))
        }
    }

    impl GraphicsDevice for RecordingDevice {
        type Buffer = usize;

        fn create_buffer(&self, label: &str, kind: BufferKind, size: u64) -> Result<usize> {
            if size == 0 || self.max_buffer_size.is_some_and(|max| size > max) {
                return Err(PlotError::DeviceResourceCreationFailed {
                    label: label.to_string(),
                    reason: format!("size {size} rejected"),
                });
            }
            let mut buffers = self.buffers.borrow_mut();
            buffers.push(RecordedBuffer {
                label: label.to_string(),
                kind,
                data: vec![0; size as usize],
            });
            Ok(buffers.len() - 1)
        }

        fn write_buffer(&self, buffer: &usize, offset: u64, data: &[u8]) {
            let mut buffers = self.buffers.borrow_mut();
            let target = &mut buffers[*buffer].data;
            let start = offset as usize;
            assert!(
                start + data.len() <= target.len(),
                "write of {} bytes at {} overflows {} byte buffer",
                data.len(),
                start,
                target.len()
            );
            target[start..start + data.len()].copy_from_slice(data);
            self.writes.set(self.writes.get() + 1);
        }
    }
}

/*!
Typed `wgpu` buffers.

A buffer created from a slice of `A` can only be rewritten with `A`s, so the
fragment shader's view of the levels and of the frame uniform can't drift
from the Rust types that fill them.
*/

use std::marker::PhantomData;

use wgpu::util::DeviceExt;

/// Read-only storage buffer holding `len` values of `A`.
pub struct Storage<A> {
    buffer: wgpu::Buffer,
    len: usize,
    phantom_data: PhantomData<A>,
}

impl<A: bytemuck::Pod + bytemuck::Zeroable> Storage<A> {
    pub fn create(device: &wgpu::Device, label: &str, contents: &[A]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(contents),
            usage: wgpu::BufferUsages::STORAGE,
        });

        Self {
            buffer,
            len: contents.len(),
            phantom_data: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}

/// Uniform buffer holding a single `A`.
pub struct Uniform<A> {
    buffer: wgpu::Buffer,
    phantom_data: PhantomData<A>,
}

impl<A: bytemuck::Pod + bytemuck::Zeroable> Uniform<A> {
    pub fn create(device: &wgpu::Device, label: &str, contents: A) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[contents]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            buffer,
            phantom_data: PhantomData,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, contents: A) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[contents]));
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}

//! GPU-visible per-entity records and the CPU staging buffer
//!
//! Every entity owns a fixed region of one shared uniform buffer, reserved
//! at pool creation: `slot index × stride`, where the stride is the record
//! size rounded up to the device's uniform-offset alignment. The publish
//! step packs one [`InstanceData`] per live entity into the staging bytes;
//! the render crate uploads the whole staging buffer in one write.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use tracing::error;

/// Fixed-layout per-entity uniform record.
///
/// Field order and layout are part of the shader interface; any consumer of
/// the instance buffer must match it exactly. The normal matrix is derived
/// from rotation only and stored as three padded columns. `light_mvp` is
/// identity unless the frame supplies a light view-projection.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    pub mvp: Mat4,
    pub model: Mat4,
    pub normal: [Vec4; 3],
    pub color: Vec4,
    pub light_mvp: Mat4,
}

impl InstanceData {
    /// Unpadded record size in bytes.
    pub const SIZE: usize = std::mem::size_of::<InstanceData>();
}

/// Round a record size up to a buffer offset alignment.
pub fn aligned_stride(size: usize, alignment: usize) -> usize {
    size.next_multiple_of(alignment.max(1))
}

/// CPU-side staging for the shared per-entity uniform buffer.
pub struct InstanceStaging {
    label: String,
    stride: usize,
    bytes: Vec<u8>,
}

impl InstanceStaging {
    /// Reserve `capacity` record regions, each padded to `alignment`.
    pub fn new(capacity: usize, alignment: usize, label: impl Into<String>) -> Self {
        let stride = aligned_stride(InstanceData::SIZE, alignment);
        Self {
            label: label.into(),
            stride,
            bytes: vec![0; capacity * stride],
        }
    }

    /// Byte distance between consecutive entities' regions.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Declared size of the whole buffer in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Byte offset of a slot's reserved region.
    #[inline]
    pub fn offset_of(&self, slot: u32) -> usize {
        slot as usize * self.stride
    }

    /// Write one record into a slot's region.
    ///
    /// A write that would land past the declared buffer size is skipped
    /// with a logged error; it never touches memory out of bounds.
    pub fn write(&mut self, slot: u32, data: &InstanceData) -> bool {
        let offset = self.offset_of(slot);
        let end = offset + InstanceData::SIZE;
        if end > self.bytes.len() {
            error!(
                buffer = %self.label,
                declared_size = self.bytes.len(),
                offset,
                write_size = InstanceData::SIZE,
                "instance write out of bounds, skipped"
            );
            return false;
        }
        self.bytes[offset..end].copy_from_slice(bytemuck::bytes_of(data));
        true
    }

    /// Read back a slot's record (diagnostics and tests).
    pub fn read(&self, slot: u32) -> Option<InstanceData> {
        let offset = self.offset_of(slot);
        let end = offset + InstanceData::SIZE;
        let bytes = self.bytes.get(offset..end)?;
        // The staging bytes carry no alignment guarantee.
        Some(bytemuck::pod_read_unaligned(bytes))
    }
}

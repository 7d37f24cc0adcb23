//! Target frame conventions.

/// Byte offsets and widths the code generator lays frames and objects out
/// with.
///
/// ```text
/// fp + 8   second formal (first formal of a method)
/// fp + 4   first formal (receiver of a method)
/// fp + 0   saved fp
/// fp - 4   return address
/// fp - 8   first local
/// fp - 12  second local
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Width of one variable, parameter, field, or vtable slot.
    pub slot_size: i32,
    /// Offset of the first local from the frame pointer.
    pub first_local_offset: i32,
    /// Offset of the first parameter from the frame pointer.
    pub first_param_offset: i32,
    /// Offset of the first global from the global pointer.
    pub first_global_offset: i32,
    /// Width of the object header (vtable pointer) and array header (length).
    pub header_size: i32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            slot_size: 4,
            first_local_offset: -8,
            first_param_offset: 4,
            first_global_offset: 0,
            header_size: 4,
        }
    }
}

impl FrameConfig {
    /// Frame offset of the `index`th local.
    pub fn local_offset(&self, index: u32) -> i32 {
        self.first_local_offset - self.slot_size * index as i32
    }

    /// Frame offset of the `index`th parameter slot.
    pub fn param_offset(&self, index: u32) -> i32 {
        self.first_param_offset + self.slot_size * index as i32
    }

    /// Global-segment offset of the `index`th global.
    pub fn global_offset(&self, index: u32) -> i32 {
        self.first_global_offset + self.slot_size * index as i32
    }
}

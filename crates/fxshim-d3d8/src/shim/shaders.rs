//! Legacy shader handles.
//!
//! Legacy vertex shaders are integer handles sharing a namespace with FVF codes. Handles minted
//! here are always odd: bit 0 of an FVF code (`D3DFVF_RESERVED0`) is never set, so a handle in
//! the table can never be mistaken for a fixed-function format and vice versa.

use hashbrown::HashMap;

use crate::d3d9::NativePtr;
use crate::translate::DeclConstant;

#[derive(Clone, Debug)]
pub(crate) struct VertexShaderRecord {
    /// `None` for declaration-only (fixed-function) shaders.
    pub(crate) shader: Option<NativePtr>,
    pub(crate) declaration: NativePtr,
    pub(crate) declaration_tokens: Vec<u32>,
    pub(crate) function: Option<Vec<u32>>,
    pub(crate) constants: Vec<DeclConstant>,
}

#[derive(Clone, Debug)]
pub(crate) struct PixelShaderRecord {
    pub(crate) shader: NativePtr,
    pub(crate) function: Vec<u32>,
}

#[derive(Debug)]
pub(crate) struct ShaderTable {
    vertex: HashMap<u32, VertexShaderRecord>,
    pixel: HashMap<u32, PixelShaderRecord>,
    next: u32,
}

impl Default for ShaderTable {
    fn default() -> Self {
        Self {
            vertex: HashMap::new(),
            pixel: HashMap::new(),
            next: 1,
        }
    }
}

impl ShaderTable {
    fn allocate(&mut self) -> u32 {
        let handle = self.next;
        self.next = self.next.wrapping_add(2).max(1);
        handle
    }

    pub(crate) fn insert_vertex(&mut self, record: VertexShaderRecord) -> u32 {
        let handle = self.allocate();
        self.vertex.insert(handle, record);
        handle
    }

    pub(crate) fn insert_pixel(&mut self, record: PixelShaderRecord) -> u32 {
        let handle = self.allocate();
        self.pixel.insert(handle, record);
        handle
    }

    pub(crate) fn vertex(&self, handle: u32) -> Option<&VertexShaderRecord> {
        self.vertex.get(&handle)
    }

    pub(crate) fn pixel(&self, handle: u32) -> Option<&PixelShaderRecord> {
        self.pixel.get(&handle)
    }

    pub(crate) fn remove_vertex(&mut self, handle: u32) -> Option<VertexShaderRecord> {
        self.vertex.remove(&handle)
    }

    pub(crate) fn remove_pixel(&mut self, handle: u32) -> Option<PixelShaderRecord> {
        self.pixel.remove(&handle)
    }

    pub(crate) fn drain(&mut self) -> (Vec<VertexShaderRecord>, Vec<PixelShaderRecord>) {
        (
            self.vertex.drain().map(|(_, r)| r).collect(),
            self.pixel.drain().map(|(_, r)| r).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_odd_and_distinct() {
        let mut table = ShaderTable::default();
        let decl = NativePtr::new(0x10).unwrap();
        let mut seen = Vec::new();
        for _ in 0..4 {
            let h = table.insert_vertex(VertexShaderRecord {
                shader: None,
                declaration: decl,
                declaration_tokens: Vec::new(),
                function: None,
                constants: Vec::new(),
            });
            assert_eq!(h & 1, 1);
            assert!(!seen.contains(&h));
            seen.push(h);
        }
        assert!(table.vertex(seen[2]).is_some());
        assert!(table.vertex(0x142).is_none());
    }
}

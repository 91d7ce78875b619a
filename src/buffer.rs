use crate::{
    handle::{Handle, HandleId},
    renderer::Renderer,
};

/// Vertex buffer of f32 components
#[derive(Debug)]
pub struct VertexBuffer {
    handle: Handle,
    len: usize,
}

impl VertexBuffer {
    pub fn new(renderer: &mut Renderer, data: &[f32]) -> Self {
        let handle = renderer.alloc_handle();
        renderer
            .backend_mut()
            .create_vertex_buffer(handle.id(), data);
        Self {
            handle,
            len: data.len(),
        }
    }

    /// Replace the buffer content, the length must not change
    pub fn update(&self, renderer: &mut Renderer, data: &[f32]) {
        debug_assert_eq!(data.len(), self.len);
        renderer
            .backend_mut()
            .update_vertex_buffer(self.handle.id(), data);
    }

    pub fn id(&self) -> HandleId {
        self.handle.id()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug)]
pub struct IndexBuffer {
    handle: Handle,
    count: u32,
}

impl IndexBuffer {
    pub fn new(renderer: &mut Renderer, indices: &[u32]) -> Self {
        let handle = renderer.alloc_handle();
        renderer
            .backend_mut()
            .create_index_buffer(handle.id(), indices);
        Self {
            handle,
            count: indices.len() as u32,
        }
    }

    pub fn id(&self) -> HandleId {
        self.handle.id()
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutElement {
    /// Components per vertex
    pub count: u32,
    pub normalized: bool,
}

impl LayoutElement {
    pub fn size(&self) -> u32 {
        self.count * std::mem::size_of::<f32>() as u32
    }
}

#[derive(Debug, Clone, Default)]
pub struct VertexBufferLayout {
    elements: Vec<LayoutElement>,
    stride: u32,
}

impl VertexBufferLayout {
    pub fn add_element(&mut self, count: u32, normalized: bool) {
        let element = LayoutElement { count, normalized };
        self.stride += element.size();
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[LayoutElement] {
        &self.elements
    }

    pub fn stride(&self) -> u32 {
        self.stride
    }
}

/// One enabled vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub index: u32,
    pub buffer: HandleId,
    pub element: LayoutElement,
    pub offset: u32,
    pub stride: u32,
}

/// Vertex buffers bound to consecutive attribute locations
#[derive(Debug, Default)]
pub struct VertexArray {
    attributes: Vec<VertexAttribute>,
    buffers: Vec<Handle>,
}

impl VertexArray {
    pub fn add_buffer(&mut self, buffer: &VertexBuffer, layout: &VertexBufferLayout) {
        let mut offset = 0;
        for element in layout.elements() {
            self.attributes.push(VertexAttribute {
                index: self.attributes.len() as u32,
                buffer: buffer.id(),
                element: *element,
                offset,
                stride: layout.stride(),
            });
            offset += element.size();
        }
        self.buffers.push(buffer.handle.clone());
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn attribute(&self, index: u32) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.index == index)
    }
}

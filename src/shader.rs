use core::fmt;

use glam::Mat4;
use hashbrown::HashSet;
use thiserror::Error;

use crate::{
    errors::Result,
    handle::{Handle, HandleId},
    renderer::Renderer,
};

/// Default sprite vertex shader
pub const SPRITE_VERTEX_SOURCE: &str = "#version 410 core
layout(location = 0) in vec2 vertexPosition;
layout(location = 1) in vec2 textureCoords;
out vec2 texCoords;
uniform mat4 modelMat;
uniform mat4 projectionMat;
void main() {
    texCoords = textureCoords;
    gl_Position = projectionMat * modelMat * vec4(vertexPosition, 0.0, 1.0);
}
";

/// Default sprite fragment shader, samples texture unit `tex`
pub const SPRITE_FRAGMENT_SOURCE: &str = "#version 410 core
in vec2 texCoords;
out vec4 fragColor;
uniform sampler2D tex;
void main() {
    fragColor = texture(tex, texCoords);
}
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Vertex => "VERTEX SHADER compile-time",
            Self::Fragment => "FRAGMENT SHADER compile-time",
            Self::Link => "SHADER PROGRAM linking-time",
        };
        f.write_str(s)
    }
}

/// Compile or link failure, with the driver log
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} error: {log}")]
pub struct ShaderError {
    pub stage: ShaderStage,
    pub log: String,
}

impl ShaderError {
    pub fn new(stage: ShaderStage, log: impl Into<String>) -> Self {
        Self {
            stage,
            log: log.into(),
        }
    }
}

/// Linked shader program
#[derive(Debug)]
pub struct ShaderProgram {
    handle: Handle,
}

impl ShaderProgram {
    /// Compile both stages and link them
    pub fn new(
        renderer: &mut Renderer,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let handle = renderer.alloc_handle();
        renderer
            .backend_mut()
            .create_program(handle.id(), vertex_source, fragment_source)?;
        Ok(Self { handle })
    }

    pub fn id(&self) -> HandleId {
        self.handle.id()
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn set_uniform_i32(&self, renderer: &mut Renderer, name: &str, value: i32) -> Result<()> {
        renderer
            .backend_mut()
            .set_uniform_i32(self.id(), name, value)
    }

    pub fn set_uniform_mat4(
        &self,
        renderer: &mut Renderer,
        name: &str,
        value: &Mat4,
    ) -> Result<()> {
        renderer
            .backend_mut()
            .set_uniform_mat4(self.id(), name, value)
    }
}

/// Declarations of a single GLSL stage, enough for the non-GL backends
/// to check a program and know its uniforms.
#[derive(Debug, Default)]
pub(crate) struct StageInterface {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub uniforms: Vec<String>,
}

pub(crate) fn inspect_stage(
    stage: ShaderStage,
    source: &str,
) -> Result<StageInterface, ShaderError> {
    if source.trim().is_empty() {
        return Err(ShaderError::new(stage, "empty shader source"));
    }
    if !source.contains("void main") {
        return Err(ShaderError::new(stage, "'main' : function not defined"));
    }
    let mut interface = StageInterface::default();
    for line in source.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        let Some(decl) = line.strip_suffix(';') else {
            continue;
        };
        let tokens: Vec<&str> = decl.split_whitespace().collect();
        let Some(name) = tokens.last() else {
            continue;
        };
        let name = name.to_string();
        if tokens.contains(&"uniform") {
            interface.uniforms.push(name);
        } else if tokens.contains(&"in") {
            interface.inputs.push(name);
        } else if tokens.contains(&"out") {
            interface.outputs.push(name);
        }
    }
    Ok(interface)
}

/// Check both stages and link them, returning the declared uniform names
pub(crate) fn inspect_program(
    vertex_source: &str,
    fragment_source: &str,
) -> Result<HashSet<String>, ShaderError> {
    let vertex = inspect_stage(ShaderStage::Vertex, vertex_source)?;
    let fragment = inspect_stage(ShaderStage::Fragment, fragment_source)?;
    if let Some(missing) = fragment
        .inputs
        .iter()
        .find(|input| !vertex.outputs.contains(input))
    {
        return Err(ShaderError::new(
            ShaderStage::Link,
            format!("fragment input '{missing}' is not written by the vertex shader"),
        ));
    }
    Ok(vertex
        .uniforms
        .into_iter()
        .chain(fragment.uniforms)
        .collect())
}

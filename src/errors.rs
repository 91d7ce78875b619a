use std::{fmt, path::PathBuf};

use thiserror::Error;

use crate::shader::ShaderError;

/// Kind of named asset, used in lookup errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Shader,
    Texture,
    SubTexture,
    Sprite,
    AnimatedSprite,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Shader => "shader program",
            Self::Texture => "texture",
            Self::SubTexture => "sub texture",
            Self::Sprite => "sprite",
            Self::AnimatedSprite => "animated sprite",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("can't find the {kind}: {name}")]
    AssetNotFound { kind: AssetKind, name: String },
    #[error(
        "can't load shader program {name} (vertex: {vertex_path}, fragment: {fragment_path}): {source}"
    )]
    Shader {
        name: String,
        vertex_path: String,
        fragment_path: String,
        #[source]
        source: ShaderError,
    },
    #[error(transparent)]
    ShaderProgram(#[from] ShaderError),
    #[error("there is no uniform with the name {0}")]
    UniformNotFound(String),
    #[error("can't find animation state: {0}")]
    AnimationStateNotFound(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("failed to open file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("can't load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn not_found(kind: AssetKind, name: impl Into<String>) -> Self {
        Self::AssetNotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Wrap the error with the name of the asset being built
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error of a context chain
    pub fn root(&self) -> &Error {
        match self {
            Self::Context { source, .. } => source.root(),
            err => err,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Maps a model reference to the codec that can decode it.

use std::fmt;
use std::str::FromStr;

/// The closed set of formats the gallery accepts for upload. `Stl` is
/// recognized so the failure message can name it, but has no decoder yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Gltf,
    Glb,
    Obj,
    Fbx,
    Stl,
    Unknown,
}

impl ModelFormat {
    /// Whether a decoder exists for the format.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            ModelFormat::Gltf | ModelFormat::Glb | ModelFormat::Obj | ModelFormat::Fbx
        )
    }

    pub fn from_extension(extension: &str) -> Self {
        match extension {
            "gltf" => ModelFormat::Gltf,
            "glb" => ModelFormat::Glb,
            "obj" => ModelFormat::Obj,
            "fbx" => ModelFormat::Fbx,
            "stl" => ModelFormat::Stl,
            _ => ModelFormat::Unknown,
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelFormat::Gltf => "gltf",
            ModelFormat::Glb => "glb",
            ModelFormat::Obj => "obj",
            ModelFormat::Fbx => "fbx",
            ModelFormat::Stl => "stl",
            ModelFormat::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ModelFormat::from_extension(&s.to_ascii_lowercase()) {
            ModelFormat::Unknown => Err(format!(
                "unknown model format '{s}' (expected gltf, glb, obj, fbx or stl)"
            )),
            format => Ok(format),
        }
    }
}

/// One asset to display: the signed download URL plus the format the upload
/// form recorded, if any. Built by the presentation layer per view request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReference {
    pub url: String,
    pub format: Option<ModelFormat>,
}

impl ModelReference {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: None,
        }
    }

    pub fn with_format(url: impl Into<String>, format: ModelFormat) -> Self {
        Self {
            url: url.into(),
            format: Some(format),
        }
    }
}

/// Total resolution: a declared format is trusted as-is, otherwise the
/// suffix after the last `.` of the URL path decides. Query string and
/// fragment are stripped first so signed URLs resolve like plain ones.
pub fn resolve(reference: &ModelReference) -> ModelFormat {
    if let Some(format) = reference.format {
        return format;
    }

    let path = reference
        .url
        .split(['?', '#'])
        .next()
        .unwrap_or(reference.url.as_str());
    match path.rsplit_once('.') {
        Some((_, suffix)) => ModelFormat::from_extension(&suffix.to_ascii_lowercase()),
        None => ModelFormat::Unknown,
    }
}

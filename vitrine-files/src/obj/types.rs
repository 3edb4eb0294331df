/// Parsed Wavefront geometry. Vertex data lists are file-global; faces
/// reference them through zero-based, already-validated indices.
#[derive(Debug, Default)]
pub struct ObjAsset {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub groups: Vec<ObjGroup>,
}

/// One `o`/`g`/`usemtl` scope with its triangulated faces.
#[derive(Debug, Default)]
pub struct ObjGroup {
    pub name: Option<String>,
    /// Material name from `usemtl`. Material libraries are sibling files the
    /// single-URL pipeline cannot fetch, so the name is all that survives.
    pub material: Option<String>,
    pub faces: Vec<[FaceVertex; 3]>,
}

/// One corner of a face: indices into the asset-global vertex data lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceVertex {
    pub position: u32,
    pub texcoord: Option<u32>,
    pub normal: Option<u32>,
}

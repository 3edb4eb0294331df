//! Node-record tree of the binary container plus typed views over the
//! `Objects`/`Connections` sections that the importer consumes.

use num_enum::TryFromPrimitive;

use crate::ParserError;

/// 21 magic bytes, followed by `0x1A 0x00` and the version word.
pub const FBX_MAGIC: &[u8; 21] = b"Kaydara FBX Binary  \0";

/// Versions 7.0 through 7.7; records from 7.5 on use 64-bit offsets.
pub const FBX_VERSION_MIN: u32 = 7000;
pub const FBX_VERSION_MAX: u32 = 7700;
pub const FBX_VERSION_WIDE_OFFSETS: u32 = 7500;

/// Property type codes as stored in the record stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum PropertyTypeCode {
    I16 = b'Y',
    Bool = b'C',
    I32 = b'I',
    I64 = b'L',
    F32 = b'F',
    F64 = b'D',
    F32Array = b'f',
    F64Array = b'd',
    I32Array = b'i',
    I64Array = b'l',
    BoolArray = b'b',
    String = b'S',
    Raw = b'R',
}

#[derive(Debug, Clone, PartialEq)]
pub enum FbxProperty {
    I16(i16),
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    BoolArray(Vec<bool>),
    String(String),
    Raw(Vec<u8>),
}

impl FbxProperty {
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            FbxProperty::I16(v) => Some(v as i64),
            FbxProperty::I32(v) => Some(v as i64),
            FbxProperty::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FbxProperty::F32(v) => Some(v as f64),
            FbxProperty::F64(v) => Some(v),
            FbxProperty::I16(v) => Some(v as f64),
            FbxProperty::I32(v) => Some(v as f64),
            FbxProperty::I64(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FbxProperty::String(v) => Some(v),
            _ => None,
        }
    }

    /// Flat float data regardless of the stored precision.
    pub fn as_f64_array(&self) -> Option<Vec<f64>> {
        match self {
            FbxProperty::F64Array(v) => Some(v.clone()),
            FbxProperty::F32Array(v) => Some(v.iter().map(|&x| x as f64).collect()),
            _ => None,
        }
    }

    pub fn as_i32_array(&self) -> Option<Vec<i32>> {
        match self {
            FbxProperty::I32Array(v) => Some(v.clone()),
            FbxProperty::I64Array(v) => Some(v.iter().map(|&x| x as i32).collect()),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct FbxNode {
    pub name: String,
    pub properties: Vec<FbxProperty>,
    pub children: Vec<FbxNode>,
}

impl FbxNode {
    pub fn child(&self, name: &str) -> Option<&FbxNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FbxNode> {
        self.children.iter().filter(move |child| child.name == name)
    }
}

/// Object names are stored reversed with a `0x00 0x01` separator,
/// e.g. `Cube\x00\x01Model` for `Model::Cube`.
pub fn display_name(raw: &str) -> &str {
    raw.split('\u{0}').next().unwrap_or(raw)
}

#[derive(Debug)]
pub struct FbxAsset {
    pub version: u32,
    pub nodes: Vec<FbxNode>,
}

/// Geometry payload of one `Geometry` object: control points plus the
/// negative-terminated polygon index stream.
#[derive(Debug)]
pub struct FbxGeometry {
    pub id: i64,
    pub positions: Vec<[f64; 3]>,
    pub polygon_vertex_index: Vec<i32>,
    pub normals: Option<FbxNormalLayer>,
}

#[derive(Debug)]
pub struct FbxNormalLayer {
    pub mapping: String,
    pub reference: String,
    pub normals: Vec<[f64; 3]>,
}

#[derive(Debug)]
pub struct FbxModel {
    pub id: i64,
    pub name: String,
    pub translation: [f64; 3],
    /// Euler angles in degrees, XYZ application order.
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

#[derive(Debug)]
pub struct FbxMaterial {
    pub id: i64,
    pub name: String,
    pub diffuse_color: Option<[f64; 3]>,
    pub shininess: Option<f64>,
}

impl FbxGeometry {
    /// Resolves the polygon stream into triangles. A polygon ends at a
    /// negative index, which encodes `-(actual + 1)`; polygons with more
    /// than three corners are fan-triangulated.
    pub fn triangulate(&self) -> Result<Vec<[u32; 3]>, ParserError> {
        let mut triangles = Vec::new();
        let mut polygon: Vec<u32> = Vec::with_capacity(4);

        for &raw in &self.polygon_vertex_index {
            let (index, last) = if raw < 0 {
                ((-raw - 1) as u32, true)
            } else {
                (raw as u32, false)
            };
            if index as usize >= self.positions.len() {
                return Err(ParserError::format(format!(
                    "polygon references control point {index} of {}",
                    self.positions.len()
                )));
            }
            polygon.push(index);

            if last {
                if polygon.len() < 3 {
                    return Err(ParserError::format(
                        "polygon terminated with fewer than 3 corners",
                    ));
                }
                for i in 1..polygon.len() - 1 {
                    triangles.push([polygon[0], polygon[i], polygon[i + 1]]);
                }
                polygon.clear();
            }
        }

        if !polygon.is_empty() {
            return Err(ParserError::format("polygon stream ends without a terminator"));
        }
        Ok(triangles)
    }
}

impl FbxAsset {
    fn top(&self, name: &str) -> Option<&FbxNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn geometries(&self) -> Result<Vec<FbxGeometry>, ParserError> {
        let Some(objects) = self.top("Objects") else {
            return Ok(Vec::new());
        };

        let mut geometries = Vec::new();
        for node in objects.children_named("Geometry") {
            let id = node
                .properties
                .first()
                .and_then(FbxProperty::as_i64)
                .ok_or_else(|| ParserError::format("Geometry object without an id"))?;

            let positions = match node.child("Vertices").and_then(|n| n.properties.first()) {
                Some(prop) => group_triplets(prop.as_f64_array().ok_or_else(|| {
                    ParserError::format("Vertices property is not a float array")
                })?)?,
                None => Vec::new(),
            };
            let polygon_vertex_index = node
                .child("PolygonVertexIndex")
                .and_then(|n| n.properties.first())
                .and_then(FbxProperty::as_i32_array)
                .unwrap_or_default();

            let normals = node.child("LayerElementNormal").and_then(|layer| {
                let normals = layer
                    .child("Normals")
                    .and_then(|n| n.properties.first())
                    .and_then(FbxProperty::as_f64_array)?;
                Some(FbxNormalLayer {
                    mapping: layer
                        .child("MappingInformationType")
                        .and_then(|n| n.properties.first())
                        .and_then(FbxProperty::as_str)
                        .unwrap_or("")
                        .to_owned(),
                    reference: layer
                        .child("ReferenceInformationType")
                        .and_then(|n| n.properties.first())
                        .and_then(FbxProperty::as_str)
                        .unwrap_or("")
                        .to_owned(),
                    normals: group_triplets(normals).ok()?,
                })
            });

            geometries.push(FbxGeometry {
                id,
                positions,
                polygon_vertex_index,
                normals,
            });
        }
        Ok(geometries)
    }

    pub fn models(&self) -> Result<Vec<FbxModel>, ParserError> {
        let Some(objects) = self.top("Objects") else {
            return Ok(Vec::new());
        };

        let mut models = Vec::new();
        for node in objects.children_named("Model") {
            let id = node
                .properties
                .first()
                .and_then(FbxProperty::as_i64)
                .ok_or_else(|| ParserError::format("Model object without an id"))?;
            let name = node
                .properties
                .get(1)
                .and_then(FbxProperty::as_str)
                .map(display_name)
                .unwrap_or("")
                .to_owned();

            // TODO: apply PreRotation/GeometricTranslation once an exporter
            // that emits them shows up in the gallery corpus.
            let mut model = FbxModel {
                id,
                name,
                translation: [0.0; 3],
                rotation: [0.0; 3],
                scale: [1.0; 3],
            };
            for (prop_name, value) in properties70(node) {
                match prop_name {
                    "Lcl Translation" => model.translation = value,
                    "Lcl Rotation" => model.rotation = value,
                    "Lcl Scaling" => model.scale = value,
                    _ => (),
                }
            }
            models.push(model);
        }
        Ok(models)
    }

    pub fn materials(&self) -> Result<Vec<FbxMaterial>, ParserError> {
        let Some(objects) = self.top("Objects") else {
            return Ok(Vec::new());
        };

        let mut materials = Vec::new();
        for node in objects.children_named("Material") {
            let id = node
                .properties
                .first()
                .and_then(FbxProperty::as_i64)
                .ok_or_else(|| ParserError::format("Material object without an id"))?;
            let name = node
                .properties
                .get(1)
                .and_then(FbxProperty::as_str)
                .map(display_name)
                .unwrap_or("")
                .to_owned();

            let mut diffuse_color = None;
            let mut shininess = None;
            if let Some(props) = node.child("Properties70") {
                for p in props.children_named("P") {
                    match p.properties.first().and_then(FbxProperty::as_str) {
                        Some("DiffuseColor") => {
                            if let (Some(r), Some(g), Some(b)) = (
                                p.properties.get(4).and_then(FbxProperty::as_f64),
                                p.properties.get(5).and_then(FbxProperty::as_f64),
                                p.properties.get(6).and_then(FbxProperty::as_f64),
                            ) {
                                diffuse_color = Some([r, g, b]);
                            }
                        }
                        Some("Shininess") | Some("ShininessExponent") => {
                            shininess = p.properties.get(4).and_then(FbxProperty::as_f64);
                        }
                        _ => (),
                    }
                }
            }

            materials.push(FbxMaterial {
                id,
                name,
                diffuse_color,
                shininess,
            });
        }
        Ok(materials)
    }

    /// Object-to-object links as `(child id, parent id)` pairs.
    pub fn connections(&self) -> Vec<(i64, i64)> {
        let Some(connections) = self.top("Connections") else {
            return Vec::new();
        };

        connections
            .children_named("C")
            .filter(|c| c.properties.first().and_then(FbxProperty::as_str) == Some("OO"))
            .filter_map(|c| {
                let child = c.properties.get(1).and_then(FbxProperty::as_i64)?;
                let parent = c.properties.get(2).and_then(FbxProperty::as_i64)?;
                Some((child, parent))
            })
            .collect()
    }
}

/// The vector-valued entries of a node's `Properties70` block.
fn properties70(node: &FbxNode) -> Vec<(&str, [f64; 3])> {
    let Some(props) = node.child("Properties70") else {
        return Vec::new();
    };

    props
        .children_named("P")
        .filter_map(|p| {
            let name = p.properties.first().and_then(FbxProperty::as_str)?;
            let x = p.properties.get(4).and_then(FbxProperty::as_f64)?;
            let y = p.properties.get(5).and_then(FbxProperty::as_f64)?;
            let z = p.properties.get(6).and_then(FbxProperty::as_f64)?;
            Some((name, [x, y, z]))
        })
        .collect()
}

fn group_triplets(flat: Vec<f64>) -> Result<Vec<[f64; 3]>, ParserError> {
    if flat.len() % 3 != 0 {
        return Err(ParserError::format(format!(
            "float array length {} is not divisible by 3",
            flat.len()
        )));
    }
    Ok(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

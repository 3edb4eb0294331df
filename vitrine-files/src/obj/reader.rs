use std::io::BufRead;

use crate::obj::types::{FaceVertex, ObjAsset, ObjGroup};
use crate::ParserError;

pub struct ObjReader {}

impl ObjReader {
    /// Line-based parse of the polygon statements. Faces with more than
    /// three corners are fan-triangulated; negative indices resolve against
    /// the current length of the respective data list, as the format defines.
    /// `mtllib`, smoothing groups, comments and unknown keywords are skipped.
    pub fn parse_asset<R: BufRead>(rdr: &mut R) -> Result<ObjAsset, ParserError> {
        let mut asset = ObjAsset::default();
        let mut group = ObjGroup::default();

        for (line_no, line) in rdr.lines().enumerate() {
            let line = line?;
            let line_no = line_no + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut tokens = trimmed.split_whitespace();
            let keyword = tokens.next().unwrap();
            match keyword {
                "v" => asset.positions.push(parse_vec3(&mut tokens, line_no)?),
                "vn" => asset.normals.push(parse_vec3(&mut tokens, line_no)?),
                "vt" => asset.texcoords.push(parse_vec2(&mut tokens, line_no)?),
                "f" => {
                    let corners = parse_face(&asset, &mut tokens, line_no)?;
                    for i in 1..corners.len() - 1 {
                        group.faces.push([corners[0], corners[i], corners[i + 1]]);
                    }
                }
                "o" | "g" => {
                    let name = tokens.next().map(str::to_owned);
                    group = next_group(&mut asset, group);
                    group.name = name;
                }
                "usemtl" => {
                    let material = tokens.next().map(str::to_owned);
                    if !group.faces.is_empty() {
                        let name = group.name.clone();
                        group = next_group(&mut asset, group);
                        group.name = name;
                    }
                    group.material = material;
                }
                _ => (),
            }
        }

        if !group.faces.is_empty() {
            asset.groups.push(group);
        }
        Ok(asset)
    }
}

/// Closes the current scope (kept only if it produced faces) and opens a new
/// one. The active material persists across group statements.
fn next_group(asset: &mut ObjAsset, current: ObjGroup) -> ObjGroup {
    let material = current.material.clone();
    if !current.faces.is_empty() {
        asset.groups.push(current);
    }
    ObjGroup {
        material,
        ..ObjGroup::default()
    }
}

fn parse_f32<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<f32, ParserError> {
    let token = tokens
        .next()
        .ok_or_else(|| ParserError::format(format!("line {line_no}: missing float component")))?;
    token
        .parse::<f32>()
        .map_err(|_| ParserError::format(format!("line {line_no}: malformed float '{token}'")))
}

fn parse_vec3<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<[f32; 3], ParserError> {
    Ok([
        parse_f32(tokens, line_no)?,
        parse_f32(tokens, line_no)?,
        parse_f32(tokens, line_no)?,
    ])
}

fn parse_vec2<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<[f32; 2], ParserError> {
    Ok([parse_f32(tokens, line_no)?, parse_f32(tokens, line_no)?])
}

fn parse_face<'a>(
    asset: &ObjAsset,
    tokens: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<Vec<FaceVertex>, ParserError> {
    let mut corners = Vec::new();
    for token in tokens {
        corners.push(parse_face_vertex(asset, token, line_no)?);
    }
    if corners.len() < 3 {
        return Err(ParserError::format(format!(
            "line {line_no}: face with fewer than 3 vertices"
        )));
    }
    Ok(corners)
}

/// `v`, `v/vt`, `v//vn` and `v/vt/vn` reference forms.
fn parse_face_vertex(asset: &ObjAsset, token: &str, line_no: usize) -> Result<FaceVertex, ParserError> {
    let mut parts = token.split('/');

    let position = resolve_index(
        parts.next().unwrap_or(""),
        asset.positions.len(),
        line_no,
        "vertex",
    )?;
    let texcoord = match parts.next() {
        None | Some("") => None,
        Some(part) => Some(resolve_index(part, asset.texcoords.len(), line_no, "texcoord")?),
    };
    let normal = match parts.next() {
        None | Some("") => None,
        Some(part) => Some(resolve_index(part, asset.normals.len(), line_no, "normal")?),
    };

    Ok(FaceVertex {
        position,
        texcoord,
        normal,
    })
}

/// Turns a 1-based (or negative, relative-to-end) reference into a checked
/// zero-based index.
fn resolve_index(token: &str, len: usize, line_no: usize, what: &str) -> Result<u32, ParserError> {
    let raw = token.parse::<i64>().map_err(|_| {
        ParserError::format(format!("line {line_no}: malformed {what} index '{token}'"))
    })?;

    let resolved = if raw > 0 {
        (raw - 1) as usize
    } else if raw < 0 {
        let back = (-raw) as usize;
        if back > len {
            return Err(ParserError::format(format!(
                "line {line_no}: {what} index {raw} reaches before the list start"
            )));
        }
        len - back
    } else {
        return Err(ParserError::format(format!(
            "line {line_no}: {what} index 0 (indices are 1-based)"
        )));
    };

    if resolved >= len {
        return Err(ParserError::format(format!(
            "line {line_no}: {what} index {raw} out of range (have {len})"
        )));
    }
    Ok(resolved as u32)
}

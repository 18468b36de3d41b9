//! Minimal decoders: enough of each format to size and bound a resource.

use framecore_common::Aabb;
use glam::Vec3;

/// Mesh facts extracted from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub name: String,
    pub vertex_count: u32,
    pub index_count: u32,
    pub bounds: Aabb,
}

/// Parse glTF JSON. Counts come from the `POSITION` and index accessors of
/// every primitive; bounds from the `POSITION` accessor min/max.
pub fn parse_gltf(bytes: &[u8], fallback_name: &str) -> Result<MeshInfo, String> {
    let json: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    let meshes = json
        .get("meshes")
        .and_then(|m| m.as_array())
        .filter(|m| !m.is_empty())
        .ok_or("no meshes")?;
    let accessors = json
        .get("accessors")
        .and_then(|a| a.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();
    let accessor = |index: &serde_json::Value| index.as_u64().and_then(|i| accessors.get(i as usize));

    let name = meshes[0]
        .get("name")
        .and_then(|n| n.as_str())
        .unwrap_or(fallback_name)
        .to_string();

    let mut vertex_count = 0u32;
    let mut index_count = 0u32;
    let mut bounds: Option<Aabb> = None;
    for mesh in meshes {
        let primitives = mesh.get("primitives").and_then(|p| p.as_array());
        for prim in primitives.into_iter().flatten() {
            if let Some(pos) = prim.pointer("/attributes/POSITION").and_then(accessor) {
                let count = pos.get("count").and_then(|c| c.as_u64()).ok_or("POSITION without count")?;
                vertex_count = vertex_count.saturating_add(count as u32);
                if let (Some(min), Some(max)) = (vec3_field(pos, "min"), vec3_field(pos, "max")) {
                    let b = Aabb::new(min, max);
                    bounds = Some(match bounds {
                        Some(acc) => Aabb::new(acc.min.min(b.min), acc.max.max(b.max)),
                        None => b,
                    });
                }
            }
            if let Some(idx) = prim.get("indices").and_then(accessor) {
                let count = idx.get("count").and_then(|c| c.as_u64()).unwrap_or(0);
                index_count = index_count.saturating_add(count as u32);
            }
        }
    }

    Ok(MeshInfo {
        name,
        vertex_count,
        index_count,
        bounds: bounds.unwrap_or_else(unit_bounds),
    })
}

fn vec3_field(value: &serde_json::Value, key: &str) -> Option<Vec3> {
    let arr = value.get(key)?.as_array()?;
    if arr.len() < 3 {
        return None;
    }
    let c = |i: usize| arr[i].as_f64().map(|f| f as f32);
    Some(Vec3::new(c(0)?, c(1)?, c(2)?))
}

/// Parse Wavefront OBJ: `v` lines give vertices and bounds, `f` lines are
/// fan-triangulated into indices.
pub fn parse_obj(bytes: &[u8], fallback_name: &str) -> Result<MeshInfo, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
    let mut name = fallback_name.to_string();
    let mut vertices = 0u32;
    let mut indices = 0u32;
    let mut min = Vec3::splat(f32::INFINITY);
    let mut max = Vec3::splat(f32::NEG_INFINITY);

    for (line_no, line) in text.lines().enumerate() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let coords: Vec<f32> = parts
                    .take(3)
                    .map(str::parse)
                    .collect::<Result<_, _>>()
                    .map_err(|e| format!("line {}: {e}", line_no + 1))?;
                if coords.len() != 3 {
                    return Err(format!("line {}: vertex needs 3 coordinates", line_no + 1));
                }
                let p = Vec3::new(coords[0], coords[1], coords[2]);
                min = min.min(p);
                max = max.max(p);
                vertices += 1;
            }
            Some("f") => {
                let corners = parts.count() as u32;
                if corners < 3 {
                    return Err(format!("line {}: face needs 3 corners", line_no + 1));
                }
                indices += (corners - 2) * 3;
            }
            Some("o") => {
                if let Some(n) = line.split_whitespace().nth(1) {
                    name = n.to_string();
                }
            }
            _ => {}
        }
    }

    if vertices == 0 {
        return Err("no vertices".into());
    }
    Ok(MeshInfo {
        name,
        vertex_count: vertices,
        index_count: indices,
        bounds: Aabb::new(min, max),
    })
}

/// Duration in seconds of a RIFF/WAVE file, from its `fmt ` and `data` chunks.
pub fn parse_wav_duration(bytes: &[u8]) -> Result<f32, String> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err("not a RIFF/WAVE file".into());
    }
    let mut byte_rate: Option<u32> = None;
    let mut data_len: Option<u32> = None;
    let mut offset = 12;
    while offset + 8 <= bytes.len() {
        let id = &bytes[offset..offset + 4];
        let len = u32_le(&bytes[offset + 4..offset + 8]);
        let body = offset + 8;
        match id {
            b"fmt " => {
                if body + 12 > bytes.len() {
                    return Err("truncated fmt chunk".into());
                }
                byte_rate = Some(u32_le(&bytes[body + 8..body + 12]));
            }
            b"data" => data_len = Some(len),
            _ => {}
        }
        // Chunks are padded to even sizes.
        offset = body.saturating_add(len as usize + (len as usize & 1));
    }
    let byte_rate = byte_rate.ok_or("missing fmt chunk")?;
    let data_len = data_len.ok_or("missing data chunk")?;
    if byte_rate == 0 {
        return Err("zero byte rate".into());
    }
    Ok(data_len as f32 / byte_rate as f32)
}

fn u32_le(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn unit_bounds() -> Aabb {
    Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))
}

/// Build a PCM WAV image. Test and CLI helper.
pub fn encode_silent_wav(sample_rate: u32, channels: u16, seconds: f32) -> Vec<u8> {
    let bits: u16 = 16;
    let block_align = channels * (bits / 8);
    let byte_rate = sample_rate * u32::from(block_align);
    let frames = (sample_rate as f32 * seconds).round() as u32;
    let data_len = frames * u32::from(block_align);

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);
    out
}

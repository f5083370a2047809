//! Binary tile-result layout (§6), for compositor/exporter interop outside
//! the Rust process boundary.

use fractal_core::{Tile, TILE_RESULT_VERSION};

const KIND_2D: u8 = 0;
const KIND_3D: u8 = 1;

/// `{version:u16, kind:u8, width:u16, height:u16, x:u32, y:u32, flags:u32}`
/// followed by the payload, little-endian throughout.
pub fn encode_header(tile: &Tile, kind_3d: bool, flags: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(16);
    buf.extend_from_slice(&TILE_RESULT_VERSION.to_le_bytes());
    buf.push(if kind_3d { KIND_3D } else { KIND_2D });
    buf.extend_from_slice(&(tile.width as u16).to_le_bytes());
    buf.extend_from_slice(&(tile.height as u16).to_le_bytes());
    buf.extend_from_slice(&tile.x.to_le_bytes());
    buf.extend_from_slice(&tile.y.to_le_bytes());
    buf.extend_from_slice(&flags.to_le_bytes());
    buf
}

/// 2D payload: `iterations: f32·w·h`, `escaped: u8·w·h`, optional `finalZ: f32·2·w·h`.
pub fn encode_plane_payload(
    tile: &Tile,
    iterations: &[f32],
    escaped: &[u8],
    final_z: Option<&[f32]>,
) -> Vec<u8> {
    let pixel_count = tile.area() as usize;
    debug_assert_eq!(iterations.len(), pixel_count);
    debug_assert_eq!(escaped.len(), pixel_count);

    let mut buf = Vec::with_capacity(pixel_count * 5 + final_z.map_or(0, |z| z.len() * 4));
    for v in iterations {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf.extend_from_slice(escaped);
    if let Some(z) = final_z {
        debug_assert_eq!(z.len(), pixel_count * 2);
        for v in z {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    buf
}

/// 3D payload: `hit: u8·w·h`, `distance: f32·w·h`, `steps: u16·w·h`, `normal: f32·3·w·h`.
pub fn encode_volume_payload(
    tile: &Tile,
    hit: &[u8],
    distance: &[f32],
    steps: &[u16],
    normal: &[f32],
) -> Vec<u8> {
    let pixel_count = tile.area() as usize;
    debug_assert_eq!(hit.len(), pixel_count);
    debug_assert_eq!(distance.len(), pixel_count);
    debug_assert_eq!(steps.len(), pixel_count);
    debug_assert_eq!(normal.len(), pixel_count * 3);

    let mut buf = Vec::with_capacity(pixel_count * (1 + 4 + 2 + 12));
    buf.extend_from_slice(hit);
    for v in distance {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    for v in steps {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    for v in normal {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use fractal_core::Tile;

    #[test]
    fn header_round_trips_through_known_byte_offsets() {
        let tile = Tile::new(10, 20, 4, 4, 800, 600);
        let header = encode_header(&tile, false, 0);
        assert_eq!(header.len(), 16);
        assert_eq!(u16::from_le_bytes([header[0], header[1]]), TILE_RESULT_VERSION);
        assert_eq!(header[2], KIND_2D);
        assert_eq!(u32::from_le_bytes([header[8], header[9], header[10], header[11]]), 10);
    }

    #[test]
    fn plane_payload_length_matches_pixel_count_without_final_z() {
        let tile = Tile::new(0, 0, 2, 2, 800, 600);
        let iterations = vec![1.0f32; 4];
        let escaped = vec![1u8; 4];
        let payload = encode_plane_payload(&tile, &iterations, &escaped, None);
        assert_eq!(payload.len(), 4 * 4 + 4);
    }

    #[test]
    fn volume_payload_includes_packed_normals() {
        let tile = Tile::new(0, 0, 1, 1, 800, 600);
        let payload = encode_volume_payload(&tile, &[1], &[0.5], &[10], &[0.0, 1.0, 0.0]);
        assert_eq!(payload.len(), 1 + 4 + 2 + 12);
    }
}

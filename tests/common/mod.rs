#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub const HEADER: &str = "filename,x,y,width,height,image_width,image_height,label,iscrowd,ignore";

/// A minimal 24-bit uncompressed BMP; `imagesize` reads its header.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    const HEADERS_LEN: u32 = 14 + 40;
    let stride = (width * 3).div_ceil(4) * 4;
    let pixels_len = stride * height;
    let file_len = HEADERS_LEN + pixels_len;

    let mut bytes = Vec::with_capacity(file_len as usize);
    // file header
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_len.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&HEADERS_LEN.to_le_bytes());
    // BITMAPINFOHEADER
    for field in [40u32, width, height] {
        bytes.extend_from_slice(&field.to_le_bytes());
    }
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    for field in [0u32, pixels_len, 2835, 2835, 0, 0] {
        bytes.extend_from_slice(&field.to_le_bytes());
    }

    bytes.resize(file_len as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Builds a CSV table body from `(filename, bbox, image size, label, ignore)` rows.
pub fn csv_table(rows: &[(&str, [u32; 4], (u32, u32), &str, u8)]) -> String {
    let mut out = format!("{HEADER}\n");
    for (file, [x, y, w, h], (iw, ih), label, ignore) in rows {
        out.push_str(&format!(
            "{file},{x},{y},{w},{h},{iw},{ih},{label},0,{ignore}\n"
        ));
    }
    out
}

//! Zone raster persistence as a minimal GeoTIFF
//!
//! The zone raster is written as a little-endian, uncompressed,
//! single-strip TIFF with unsigned integer samples, plus the two GeoTIFF
//! tags needed to place it on the stack grid (pixel scale and tiepoint).
//! The reader only understands files laid out this way.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info};

use crate::errors::{ExtractError, ExtractResult};
use crate::raster::GeoTransform;
use super::raster::{ZoneDepth, ZoneRaster};

/// TIFF header constants
mod header {
    pub const LITTLE_ENDIAN_MARKER: [u8; 2] = [0x49, 0x49];
    pub const TIFF_VERSION: u16 = 42;
    pub const SIZE: u32 = 8;
}

/// Field types used by the zone file
mod field_types {
    pub const ASCII: u16 = 2;
    pub const SHORT: u16 = 3;
    pub const LONG: u16 = 4;
    pub const DOUBLE: u16 = 12;
}

/// Tags written to the zone file, in ascending order
mod tags {
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const ROWS_PER_STRIP: u16 = 278;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const SAMPLE_FORMAT: u16 = 339;
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const GDAL_NODATA: u16 = 42113;
}

const ENTRY_SIZE: u32 = 12;

/// Value part of an IFD entry, either inline or pointing at external data
enum EntryValue {
    Short(u16),
    Long(u32),
    /// Up to four inline ASCII bytes, NUL included
    Ascii([u8; 4], u32),
    Doubles(Vec<f64>),
}

struct Entry {
    tag: u16,
    value: EntryValue,
}

impl Entry {
    fn new(tag: u16, value: EntryValue) -> Self {
        Entry { tag, value }
    }
}

/// Raw entry as found in a file
#[derive(Debug, Clone, Copy)]
struct RawEntry {
    field_type: u16,
    count: u32,
    value: u32,
}

impl RawEntry {
    /// Inline scalar, SHORT values sit in the low half
    fn scalar(&self) -> u32 {
        match self.field_type {
            field_types::SHORT => self.value & 0xFFFF,
            _ => self.value,
        }
    }
}

/// Write a zone raster next to its georeferencing
///
/// # Arguments
/// * `path` - Output file
/// * `zone` - Zone raster to persist
/// * `transform` - Grid transform of the stack
///
/// # Returns
/// Result indicating success or an error
pub fn write_zone_raster(path: &Path, zone: &ZoneRaster, transform: &GeoTransform) -> ExtractResult<()> {
    info!("Writing {}x{} zone raster to {}", zone.width, zone.height, path.display());

    let width = u32::try_from(zone.width)
        .map_err(|_| ExtractError::GenericError("Zone raster too wide".to_string()))?;
    let height = u32::try_from(zone.height)
        .map_err(|_| ExtractError::GenericError("Zone raster too tall".to_string()))?;
    let data_len = u32::try_from(zone.ids.len() * zone.depth.bytes())
        .map_err(|_| ExtractError::GenericError("Zone raster too large for TIFF".to_string()))?;

    let pixel_scale = vec![transform.pixel_width, -transform.pixel_height, 0.0];
    let tiepoint = vec![0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];

    let mut entries = vec![
        Entry::new(tags::IMAGE_WIDTH, EntryValue::Long(width)),
        Entry::new(tags::IMAGE_LENGTH, EntryValue::Long(height)),
        Entry::new(tags::BITS_PER_SAMPLE, EntryValue::Short(zone.depth.bits())),
        Entry::new(tags::COMPRESSION, EntryValue::Short(1)),
        // BlackIsZero
        Entry::new(tags::PHOTOMETRIC_INTERPRETATION, EntryValue::Short(1)),
        Entry::new(tags::STRIP_OFFSETS, EntryValue::Long(0)),
        Entry::new(tags::SAMPLES_PER_PIXEL, EntryValue::Short(1)),
        Entry::new(tags::ROWS_PER_STRIP, EntryValue::Long(height)),
        Entry::new(tags::STRIP_BYTE_COUNTS, EntryValue::Long(data_len)),
        // Unsigned integer samples
        Entry::new(tags::SAMPLE_FORMAT, EntryValue::Short(1)),
        Entry::new(tags::MODEL_PIXEL_SCALE, EntryValue::Doubles(pixel_scale)),
        Entry::new(tags::MODEL_TIEPOINT, EntryValue::Doubles(tiepoint)),
        Entry::new(tags::GDAL_NODATA, EntryValue::Ascii([b'0', 0, 0, 0], 2)),
    ];
    entries.sort_by_key(|e| e.tag);

    // IFD directly after the header, then external doubles, then pixels
    let ifd_size = 2 + entries.len() as u32 * ENTRY_SIZE + 4;
    let mut offset = header::SIZE + ifd_size;
    let mut external_offsets = BTreeMap::new();
    for entry in &entries {
        if let EntryValue::Doubles(values) = &entry.value {
            external_offsets.insert(entry.tag, offset);
            offset += values.len() as u32 * 8;
        }
    }
    let data_offset = offset;
    for entry in entries.iter_mut() {
        if entry.tag == tags::STRIP_OFFSETS {
            entry.value = EntryValue::Long(data_offset);
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&header::LITTLE_ENDIAN_MARKER)?;
    writer.write_u16::<LittleEndian>(header::TIFF_VERSION)?;
    writer.write_u32::<LittleEndian>(header::SIZE)?;

    writer.write_u16::<LittleEndian>(entries.len() as u16)?;
    for entry in &entries {
        writer.write_u16::<LittleEndian>(entry.tag)?;
        match &entry.value {
            EntryValue::Short(v) => {
                writer.write_u16::<LittleEndian>(field_types::SHORT)?;
                writer.write_u32::<LittleEndian>(1)?;
                writer.write_u16::<LittleEndian>(*v)?;
                writer.write_u16::<LittleEndian>(0)?;
            },
            EntryValue::Long(v) => {
                writer.write_u16::<LittleEndian>(field_types::LONG)?;
                writer.write_u32::<LittleEndian>(1)?;
                writer.write_u32::<LittleEndian>(*v)?;
            },
            EntryValue::Ascii(bytes, count) => {
                writer.write_u16::<LittleEndian>(field_types::ASCII)?;
                writer.write_u32::<LittleEndian>(*count)?;
                writer.write_all(bytes)?;
            },
            EntryValue::Doubles(values) => {
                writer.write_u16::<LittleEndian>(field_types::DOUBLE)?;
                writer.write_u32::<LittleEndian>(values.len() as u32)?;
                writer.write_u32::<LittleEndian>(external_offsets[&entry.tag])?;
            },
        }
    }
    // No further IFDs
    writer.write_u32::<LittleEndian>(0)?;

    for entry in &entries {
        if let EntryValue::Doubles(values) = &entry.value {
            for v in values {
                writer.write_f64::<LittleEndian>(*v)?;
            }
        }
    }

    for &id in &zone.ids {
        match zone.depth {
            ZoneDepth::U8 => writer.write_u8(id as u8)?,
            ZoneDepth::U16 => writer.write_u16::<LittleEndian>(id as u16)?,
            ZoneDepth::U32 => writer.write_u32::<LittleEndian>(id)?,
        }
    }

    writer.flush()?;
    Ok(())
}

fn malformed(msg: &str) -> ExtractError {
    ExtractError::GenericError(format!("Malformed zone raster: {}", msg))
}

fn read_doubles(cursor: &mut Cursor<Vec<u8>>, entry: &RawEntry) -> ExtractResult<Vec<f64>> {
    if entry.field_type != field_types::DOUBLE {
        return Err(malformed("georeferencing tag is not DOUBLE"));
    }
    cursor.seek(SeekFrom::Start(entry.value as u64))?;
    (0..entry.count)
        .map(|_| -> ExtractResult<f64> { Ok(cursor.read_f64::<LittleEndian>()?) })
        .collect()
}

/// Read a zone raster written by [`write_zone_raster`]
///
/// # Returns
/// The zone raster and the transform stored with it
pub fn read_zone_raster(path: &Path) -> ExtractResult<(ZoneRaster, GeoTransform)> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    let mut cursor = Cursor::new(bytes);

    let mut marker = [0u8; 2];
    cursor.read_exact(&mut marker)?;
    if marker != header::LITTLE_ENDIAN_MARKER {
        return Err(malformed("expected little-endian byte order"));
    }
    if cursor.read_u16::<LittleEndian>()? != header::TIFF_VERSION {
        return Err(malformed("not a classic TIFF"));
    }
    let ifd_offset = cursor.read_u32::<LittleEndian>()?;
    cursor.seek(SeekFrom::Start(ifd_offset as u64))?;

    let count = cursor.read_u16::<LittleEndian>()?;
    let mut entries = BTreeMap::new();
    for _ in 0..count {
        let tag = cursor.read_u16::<LittleEndian>()?;
        let field_type = cursor.read_u16::<LittleEndian>()?;
        let count = cursor.read_u32::<LittleEndian>()?;
        let value = cursor.read_u32::<LittleEndian>()?;
        entries.insert(tag, RawEntry { field_type, count, value });
    }

    let scalar = |tag: u16, name: &str| -> ExtractResult<u32> {
        entries.get(&tag)
            .map(RawEntry::scalar)
            .ok_or_else(|| malformed(&format!("missing {}", name)))
    };

    let width = scalar(tags::IMAGE_WIDTH, "ImageWidth")? as usize;
    let height = scalar(tags::IMAGE_LENGTH, "ImageLength")? as usize;
    let bits = scalar(tags::BITS_PER_SAMPLE, "BitsPerSample")? as u16;
    let depth = ZoneDepth::from_bits(bits).ok_or_else(|| malformed("unsupported sample width"))?;
    if scalar(tags::COMPRESSION, "Compression")? != 1 {
        return Err(malformed("compressed data"));
    }
    if scalar(tags::SAMPLES_PER_PIXEL, "SamplesPerPixel")? != 1 {
        return Err(malformed("more than one sample per pixel"));
    }
    let strip_offset = scalar(tags::STRIP_OFFSETS, "StripOffsets")?;
    let strip_bytes = scalar(tags::STRIP_BYTE_COUNTS, "StripByteCounts")? as usize;
    if strip_bytes != width * height * depth.bytes() {
        return Err(malformed("strip size does not match dimensions"));
    }

    let scale_entry = entries.get(&tags::MODEL_PIXEL_SCALE).copied()
        .ok_or_else(|| malformed("missing ModelPixelScale"))?;
    let tie_entry = entries.get(&tags::MODEL_TIEPOINT).copied()
        .ok_or_else(|| malformed("missing ModelTiepoint"))?;
    let scale = read_doubles(&mut cursor, &scale_entry)?;
    let tiepoint = read_doubles(&mut cursor, &tie_entry)?;
    if scale.len() < 2 || tiepoint.len() < 5 {
        return Err(malformed("short georeferencing tags"));
    }
    let transform = GeoTransform::new(tiepoint[3], scale[0], tiepoint[4], -scale[1]);

    cursor.seek(SeekFrom::Start(strip_offset as u64))?;
    let mut ids = Vec::with_capacity(width * height);
    for _ in 0..width * height {
        let id = match depth {
            ZoneDepth::U8 => cursor.read_u8()? as u32,
            ZoneDepth::U16 => cursor.read_u16::<LittleEndian>()? as u32,
            ZoneDepth::U32 => cursor.read_u32::<LittleEndian>()?,
        };
        ids.push(id);
    }

    debug!("Read {}x{} zone raster ({}-bit) from {}", width, height, bits, path.display());

    Ok((ZoneRaster { width, height, depth, ids }, transform))
}

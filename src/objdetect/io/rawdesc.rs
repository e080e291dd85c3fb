//! Raw block-descriptor dump format, for an external trainer to consume.
//!
//! Grounded on `lear/io/fileheader.h`'s `FileHeader` (an 8-byte identity tag
//! plus an `i32` version) and `app/rawdescio.h`'s `RawDescIn` (a feature
//! vector stream optionally carrying, per record, the source window's
//! top-left bound, extent, scale, and source image filename). Three
//! versions are supported, matching progressively richer original dump
//! variants:
//!
//! - v100: feature vector only.
//! - v110: v100 plus the window's top-left bound, extent, and scale.
//! - v120: v110 plus the source image filename.
//!
//! Jittered-window dumping (perturbing window position before dump, used
//! only to augment training data) is out of scope here; this module dumps
//! exactly the windows the caller hands it.

use std::io::{Read, Seek, Write};

use binrw::{BinRead, BinWrite};

use crate::error::{Error, Result};

const TAG: &[u8; 8] = b"RawDesc\0";

/// Dump format version, controlling which optional fields accompany each
/// feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawDescVersion {
    V100,
    V110,
    V120,
}

impl RawDescVersion {
    fn as_i32(self) -> i32 {
        match self {
            RawDescVersion::V100 => 100,
            RawDescVersion::V110 => 110,
            RawDescVersion::V120 => 120,
        }
    }

    fn from_i32(v: i32) -> Result<Self> {
        match v {
            100 => Ok(RawDescVersion::V100),
            110 => Ok(RawDescVersion::V110),
            120 => Ok(RawDescVersion::V120),
            other => Err(Error::InvalidFormat(format!(
                "unsupported raw descriptor dump version {other}"
            ))),
        }
    }
}

/// One dumped feature vector, with the optional window metadata the
/// version carries.
#[derive(Debug, Clone)]
pub struct RawDescRecord {
    pub feature: Vec<f32>,
    /// `(lbound_x, lbound_y, extent_w, extent_h, scale)`, present from v110.
    pub window: Option<(i32, i32, i32, i32, f32)>,
    /// Source image filename, present from v120.
    pub filename: Option<String>,
}

#[derive(BinRead, BinWrite)]
#[brw(little)]
struct FileHeader {
    tag: [u8; 8],
    version: i32,
}

/// Streams `RawDescRecord`s to a writer, rewriting the record count into
/// the header once the dump is finished.
pub struct RawDescWriter<W: Write + Seek> {
    writer: W,
    version: RawDescVersion,
    count: u64,
}

impl<W: Write + Seek> RawDescWriter<W> {
    /// Writes the file header (with a placeholder record count) and
    /// returns a writer ready to accept records.
    pub fn new(mut writer: W, version: RawDescVersion) -> Result<Self> {
        let header = FileHeader {
            tag: *TAG,
            version: version.as_i32(),
        };
        header
            .write(&mut writer)
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        0u64.write_le(&mut writer)
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        Ok(Self {
            writer,
            version,
            count: 0,
        })
    }

    /// Appends one record, validating it carries the fields its version requires.
    pub fn write_record(&mut self, record: &RawDescRecord) -> Result<()> {
        if self.version != RawDescVersion::V100 && record.window.is_none() {
            return Err(Error::InvalidParameter(
                "record is missing window metadata required by this dump version".to_string(),
            ));
        }
        if self.version == RawDescVersion::V120 && record.filename.is_none() {
            return Err(Error::InvalidParameter(
                "record is missing the filename required by v120".to_string(),
            ));
        }

        (record.feature.len() as u32)
            .write_le(&mut self.writer)
            .map_err(io_err)?;
        for v in &record.feature {
            v.write_le(&mut self.writer).map_err(io_err)?;
        }

        if self.version != RawDescVersion::V100 {
            let (lx, ly, ew, eh, scale) = record.window.unwrap();
            lx.write_le(&mut self.writer).map_err(io_err)?;
            ly.write_le(&mut self.writer).map_err(io_err)?;
            ew.write_le(&mut self.writer).map_err(io_err)?;
            eh.write_le(&mut self.writer).map_err(io_err)?;
            scale.write_le(&mut self.writer).map_err(io_err)?;
        }

        if self.version == RawDescVersion::V120 {
            let name = record.filename.as_ref().unwrap();
            (name.len() as u32).write_le(&mut self.writer).map_err(io_err)?;
            self.writer.write_all(name.as_bytes())?;
        }

        self.count += 1;
        Ok(())
    }

    /// Rewrites the record count into the header and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.seek(std::io::SeekFrom::Start(8))?;
        self.count.write_le(&mut self.writer).map_err(io_err)?;
        Ok(self.writer)
    }
}

fn io_err(e: binrw::Error) -> Error {
    Error::Io(std::io::Error::other(e.to_string()))
}

/// Reads an entire raw-descriptor dump into memory.
pub fn read_all<R: Read + Seek>(mut reader: R) -> Result<Vec<RawDescRecord>> {
    let header = FileHeader::read(&mut reader).map_err(io_err)?;
    if &header.tag != TAG {
        return Err(Error::FormatMismatch {
            expected: "RawDesc\\0".to_string(),
            actual: String::from_utf8_lossy(&header.tag).to_string(),
        });
    }
    let version = RawDescVersion::from_i32(header.version)?;
    let count = u64::read_le(&mut reader).map_err(io_err)?;

    let mut records = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let len = u32::read_le(&mut reader).map_err(io_err)? as usize;
        let mut feature = Vec::with_capacity(len);
        for _ in 0..len {
            feature.push(f32::read_le(&mut reader).map_err(io_err)?);
        }

        let window = if version != RawDescVersion::V100 {
            let lx = i32::read_le(&mut reader).map_err(io_err)?;
            let ly = i32::read_le(&mut reader).map_err(io_err)?;
            let ew = i32::read_le(&mut reader).map_err(io_err)?;
            let eh = i32::read_le(&mut reader).map_err(io_err)?;
            let scale = f32::read_le(&mut reader).map_err(io_err)?;
            Some((lx, ly, ew, eh, scale))
        } else {
            None
        };

        let filename = if version == RawDescVersion::V120 {
            let len = u32::read_le(&mut reader).map_err(io_err)? as usize;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            Some(String::from_utf8_lossy(&buf).into_owned())
        } else {
            None
        };

        records.push(RawDescRecord {
            feature,
            window,
            filename,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_roundtrip_v100() {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut writer = RawDescWriter::new(cursor, RawDescVersion::V100).unwrap();
            writer
                .write_record(&RawDescRecord {
                    feature: vec![1.0, 2.0, 3.0],
                    window: None,
                    filename: None,
                })
                .unwrap();
            writer.finish().unwrap();
        }
        let records = read_all(Cursor::new(buf)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].feature, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_roundtrip_v120_with_metadata() {
        let mut buf = Vec::new();
        {
            let cursor = Cursor::new(&mut buf);
            let mut writer = RawDescWriter::new(cursor, RawDescVersion::V120).unwrap();
            writer
                .write_record(&RawDescRecord {
                    feature: vec![0.5, 0.25],
                    window: Some((10, 20, 64, 128, 1.2)),
                    filename: Some("frame_001.png".to_string()),
                })
                .unwrap();
            writer.finish().unwrap();
        }
        let records = read_all(Cursor::new(buf)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].window, Some((10, 20, 64, 128, 1.2)));
        assert_eq!(records[0].filename.as_deref(), Some("frame_001.png"));
    }

    #[test]
    fn test_v110_requires_window_metadata() {
        let buf = Vec::new();
        let cursor = Cursor::new(buf);
        let mut writer = RawDescWriter::new(cursor, RawDescVersion::V110).unwrap();
        let err = writer.write_record(&RawDescRecord {
            feature: vec![1.0],
            window: None,
            filename: None,
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_bad_tag() {
        let mut buf = vec![0u8; 20];
        buf[0] = b'X';
        assert!(read_all(Cursor::new(buf)).is_err());
    }
}

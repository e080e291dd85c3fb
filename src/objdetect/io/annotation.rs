//! Parser for PASCAL-style segmented-object annotation files.
//!
//! Grounded on `app/segobj.h`'s `readPascalAnnotations` and the matching
//! writer in `app/dumpsegd.cpp`: a line-oriented, `#`-comment-tolerant text
//! format carrying three kinds of record per image:
//!
//! - `Image filename : "..."`
//! - `Image size (X x Y x C) : W x H x C`
//! - `Bounding box for object N "label" (Xmin, Ymin) - (Xmax, Ymax) : (x0, y0) - (x1, y1)`
//!
//! The original stores bounding boxes as 1-based inclusive pixel coordinates
//! and clamps them to the image extent after converting; this parser
//! performs the same `--xmin;--ymin;--xmax;--ymax` shift to 0-based
//! inclusive coordinates and the same clamp, internally.

use crate::error::{Error, Result};

const FILENAME_HEADER: &str = "Image filename : ";
const IMAGESIZE_HEADER: &str = "Image size (X x Y x C) : ";
const BOUNDBOX_HEADER: &str = "Bounding box for object ";

/// A single 0-based inclusive bounding box, already clamped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub xmin: i64,
    pub ymin: i64,
    pub xmax: i64,
    pub ymax: i64,
}

impl BoundingBox {
    #[must_use]
    pub fn width(&self) -> i64 {
        self.xmax - self.xmin + 1
    }

    #[must_use]
    pub fn height(&self) -> i64 {
        self.ymax - self.ymin + 1
    }
}

/// One parsed annotation file: the source image's filename, size, and the
/// bounding boxes of every object whose label matched the caller's filter.
#[derive(Debug, Clone, Default)]
pub struct AnnotationRecord {
    pub filename: Option<String>,
    /// `(width, height, channels)`.
    pub image_size: Option<(i64, i64, i64)>,
    pub boxes: Vec<BoundingBox>,
}

/// Parses an annotation file's text, keeping only bounding boxes whose
/// quoted label (lowercased) appears in `object_classes`.
pub fn parse(text: &str, object_classes: &[&str]) -> Result<AnnotationRecord> {
    let mut record = AnnotationRecord::default();

    for line in text.lines() {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = find_after(line, FILENAME_HEADER) {
            record.filename = Some(rest.trim_matches('"').to_string());
        } else if let Some(rest) = find_after(line, IMAGESIZE_HEADER) {
            record.image_size = Some(parse_image_size(rest)?);
        } else if let Some(rest) = find_after(line, BOUNDBOX_HEADER) {
            let Some((width, height, _)) = record.image_size else {
                return Err(Error::InvalidFormat(
                    "bounding box encountered before image size".to_string(),
                ));
            };
            if let Some(bbox) = parse_bounding_box(rest, object_classes, width, height)? {
                record.boxes.push(bbox);
            }
        }
    }

    Ok(record)
}

fn find_after<'a>(line: &'a str, header: &str) -> Option<&'a str> {
    line.find(header).map(|idx| &line[idx + header.len()..])
}

/// Parses `"W x H x C"`.
fn parse_image_size(rest: &str) -> Result<(i64, i64, i64)> {
    let parts: Vec<&str> = rest.split('x').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(Error::InvalidFormat(format!(
            "malformed image size line: {rest}"
        )));
    }
    let width = parts[0]
        .parse()
        .map_err(|_| Error::InvalidFormat(format!("bad image width: {}", parts[0])))?;
    let height = parts[1]
        .parse()
        .map_err(|_| Error::InvalidFormat(format!("bad image height: {}", parts[1])))?;
    let channels = parts[2]
        .parse()
        .map_err(|_| Error::InvalidFormat(format!("bad image channels: {}", parts[2])))?;
    Ok((width, height, channels))
}

/// Parses `N "label" (Xmin, Ymin) - (Xmax, Ymax) : (x0, y0) - (x1, y1)`,
/// filtering on `label` and converting/clamping the coordinates after the
/// `:` to 0-based inclusive. Returns `None` when the label doesn't match.
fn parse_bounding_box(
    rest: &str,
    object_classes: &[&str],
    width: i64,
    height: i64,
) -> Result<Option<BoundingBox>> {
    let quote_start = rest
        .find('"')
        .ok_or_else(|| Error::InvalidFormat("bounding box line missing label".to_string()))?;
    let after_quote = &rest[quote_start + 1..];
    let quote_end = after_quote
        .find('"')
        .ok_or_else(|| Error::InvalidFormat("bounding box line missing closing quote".to_string()))?;
    let label = after_quote[..quote_end].to_lowercase();

    if !object_classes.iter().any(|c| c.to_lowercase() == label) {
        return Ok(None);
    }

    let coord_part = after_quote[quote_end + 1..]
        .rsplit_once(':')
        .map(|(_, after)| after)
        .ok_or_else(|| Error::InvalidFormat("bounding box line missing ':'".to_string()))?;

    let nums: Vec<i64> = coord_part
        .split(|c: char| !c.is_ascii_digit() && c != '-')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| Error::InvalidFormat(format!("bad bounding box coordinate: {s}")))
        })
        .collect::<Result<_>>()?;

    if nums.len() != 4 {
        return Err(Error::InvalidFormat(format!(
            "expected 4 bounding box coordinates, found {}",
            nums.len()
        )));
    }
    let (txmin, tymin, txmax, tymax) = (nums[0], nums[1], nums[2], nums[3]);

    let mut xmin = txmin.min(txmax) - 1;
    let mut xmax = txmin.max(txmax) - 1;
    let mut ymin = tymin.min(tymax) - 1;
    let mut ymax = tymin.max(tymax) - 1;

    if xmin < 0 {
        xmin = 0;
    }
    if xmax >= width {
        xmax = width - 1;
    }
    if ymin < 0 {
        ymin = 0;
    }
    if ymax >= height {
        ymax = height - 1;
    }

    Ok(Some(BoundingBox {
        xmin,
        ymin,
        xmax,
        ymax,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# comment line, ignored\n\
Image filename : \"person_001.png\"\n\
Image size (X x Y x C) : 320 x 240 x 3\n\
Bounding box for object 1 \"PASperson\" (Xmin, Ymin) - (Xmax, Ymax) : (10, 20) - (50, 100)\n\
Bounding box for object 2 \"PAScar\" (Xmin, Ymin) - (Xmax, Ymax) : (1, 1) - (5, 5)\n";

    #[test]
    fn test_parses_filename_and_size() {
        let record = parse(SAMPLE, &["PASperson"]).unwrap();
        assert_eq!(record.filename.as_deref(), Some("person_001.png"));
        assert_eq!(record.image_size, Some((320, 240, 3)));
    }

    #[test]
    fn test_filters_by_object_class() {
        let record = parse(SAMPLE, &["PASperson"]).unwrap();
        assert_eq!(record.boxes.len(), 1);
    }

    #[test]
    fn test_converts_to_zero_based_inclusive() {
        let record = parse(SAMPLE, &["PASperson"]).unwrap();
        let bbox = record.boxes[0];
        assert_eq!(bbox.xmin, 9);
        assert_eq!(bbox.ymin, 19);
        assert_eq!(bbox.xmax, 49);
        assert_eq!(bbox.ymax, 99);
        assert_eq!(bbox.width(), 41);
        assert_eq!(bbox.height(), 81);
    }

    #[test]
    fn test_clamps_box_to_image_extent() {
        let text = "Image filename : \"edge.png\"\n\
Image size (X x Y x C) : 100 x 100 x 3\n\
Bounding box for object 1 \"PASperson\" (Xmin, Ymin) - (Xmax, Ymax) : (0, 0) - (500, 500)\n";
        let record = parse(text, &["PASperson"]).unwrap();
        let bbox = record.boxes[0];
        assert_eq!(bbox.xmin, 0);
        assert_eq!(bbox.ymin, 0);
        assert_eq!(bbox.xmax, 99);
        assert_eq!(bbox.ymax, 99);
    }

    #[test]
    fn test_box_before_size_is_error() {
        let text = "Bounding box for object 1 \"PASperson\" (Xmin, Ymin) - (Xmax, Ymax) : (1, 1) - (2, 2)\n";
        assert!(parse(text, &["PASperson"]).is_err());
    }

    #[test]
    fn test_label_match_is_case_insensitive() {
        let record = parse(SAMPLE, &["pasperson"]).unwrap();
        assert_eq!(record.boxes.len(), 1);
    }
}

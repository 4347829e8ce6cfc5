//! Text record parser.
//!
//! Each line holds 256 space-separated pixel values (row-major 16×16, 0/1
//! floats) followed by the label tokens (one-hot digits). The reference file
//! ends every line with a single space, which is dropped before tokenizing.

use image::{GrayImage, Luma};

use crate::error::ParseError;

/// Image side length in pixels.
pub const SIDE: usize = 16;
/// Pixel tokens per line.
pub const PIXELS: usize = SIDE * SIDE;

pub type Label = Vec<i32>;

/// 16×16 grid of 8-bit intensities, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMatrix([[u8; SIDE]; SIDE]);

impl ImageMatrix {
    pub fn rows(&self) -> &[[u8; SIDE]; SIDE] {
        &self.0
    }

    pub fn pixel(&self, row: usize, col: usize) -> u8 {
        self.0[row][col]
    }

    /// Single-channel 8-bit image, `x` = column, `y` = row.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(SIDE as u32, SIDE as u32, |x, y| {
            Luma([self.0[y as usize][x as usize]])
        })
    }
}

/// One parsed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub image: ImageMatrix,
    pub label: Label,
}

impl Record {
    /// Class index of a one-hot label; None unless exactly one entry is 1 and the rest 0.
    pub fn digit(&self) -> Option<usize> {
        let mut hot = None;
        for (i, &v) in self.label.iter().enumerate() {
            match v {
                0 => {}
                1 if hot.is_none() => hot = Some(i),
                _ => return None,
            }
        }
        hot
    }
}

/// Scale a 0/1 source value to an intensity: truncate to u8, then ×255 in
/// 8-bit arithmetic. Out-of-range inputs wrap (2.0 → 254) or saturate at the
/// cast (negative and NaN → 0).
fn scale_pixel(value: f32) -> u8 {
    (value as u8).wrapping_mul(255)
}

/// Parse the whole file content. A single trailing empty segment after the
/// final newline is ignored; any other empty line is an error.
pub fn parse(raw: &str) -> Result<Vec<Record>, ParseError> {
    let mut lines: Vec<&str> = raw.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    let mut records = Vec::with_capacity(lines.len());
    for (i, line) in lines.into_iter().enumerate() {
        records.push(parse_line(i + 1, line)?);
    }
    tracing::debug!("parsed {} records", records.len());
    Ok(records)
}

/// Parse one line; `line_no` is 1-based and only used for error reporting.
pub fn parse_line(line_no: usize, line: &str) -> Result<Record, ParseError> {
    let line = strip_filler(line);
    if line.is_empty() {
        return Err(ParseError::MalformedRow {
            line: line_no,
            found: 0,
        });
    }

    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() < PIXELS {
        return Err(ParseError::MalformedRow {
            line: line_no,
            found: tokens.len(),
        });
    }

    let mut grid = [[0u8; SIDE]; SIDE];
    for (column, token) in tokens[..PIXELS].iter().enumerate() {
        let value: f32 = token.parse().map_err(|_| ParseError::InvalidPixelValue {
            line: line_no,
            column,
            token: token.to_string(),
        })?;
        grid[column / SIDE][column % SIDE] = scale_pixel(value);
    }

    let label = tokens[PIXELS..]
        .iter()
        .enumerate()
        .map(|(offset, token)| {
            token.parse::<i32>().map_err(|_| ParseError::InvalidLabelValue {
                line: line_no,
                column: PIXELS + offset,
                token: token.to_string(),
            })
        })
        .collect::<Result<Label, _>>()?;

    Ok(Record {
        image: ImageMatrix(grid),
        label,
    })
}

/// Drop a CRLF `\r`, then exactly one trailing whitespace character (the
/// file's trailing space).
fn strip_filler(line: &str) -> &str {
    let line = line.strip_suffix('\r').unwrap_or(line);
    match line.chars().last() {
        Some(c) if c.is_whitespace() => &line[..line.len() - c.len_utf8()],
        _ => line,
    }
}

//! CalculiX `cgx` 的 FBD 命令文件输出。
//!
//! DXF 的 XY 平面映射到 FBD 的 YZ 平面，X 坐标固定为 0。点、线、面的编号均从 1 开始，
//! 并按各自总数的位数补零，保证名称在 `cgx` 中按字典序排列。

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use fbd_core::convert::Conversion;
use fbd_core::model::PointIndex;
use tracing::debug;

use crate::IoError;

/// 默认缩放系数：DXF 中的毫米转换为米。
pub const DEFAULT_SCALE: f64 = 0.001;

/// 写入文件头的生成器标识。
pub const GENERATOR: &str = concat!("dxf2fbd ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct FbdEmitter {
    scale: f64,
    source: Option<String>,
}

impl Default for FbdEmitter {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE)
    }
}

impl FbdEmitter {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            source: None,
        }
    }

    /// 在文件头中注明来源文件。
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn write_to<W: Write>(&self, out: &mut W, conversion: &Conversion) -> std::io::Result<()> {
        let model = &conversion.model;
        let point_width = digits(model.points.len());
        let line_width = digits(model.edge_count());
        let point_name = |index: PointIndex| format!("P{:0point_width$}", index + 1);

        writeln!(out, "# Generated by {GENERATOR}")?;
        if let Some(source) = &self.source {
            writeln!(out, "# from “{source}”")?;
        }

        writeln!(out)?;
        writeln!(out, "# Points extracted from DXF")?;
        for (index, point) in model.points.iter().enumerate() {
            writeln!(
                out,
                "pnt {} 0.0 {:.7} {:.7}",
                point_name(index),
                point.x() * self.scale,
                point.y() * self.scale
            )?;
        }

        let mut number = 0usize;
        if !model.lines.is_empty() {
            writeln!(out)?;
            writeln!(out, "# Lines extracted from DXF")?;
            for line in &model.lines {
                number += 1;
                writeln!(
                    out,
                    "line L{number:0line_width$} {} {}",
                    point_name(line.start),
                    point_name(line.end)
                )?;
            }
        }

        if !model.arcs.is_empty() {
            writeln!(out)?;
            writeln!(out, "# Arcs extracted from DXF")?;
            for arc in &model.arcs {
                number += 1;
                writeln!(
                    out,
                    "line L{number:0line_width$} {} {} {}",
                    point_name(arc.start),
                    point_name(arc.end),
                    point_name(arc.center)
                )?;
            }
        }

        if !model.splines.is_empty() {
            writeln!(out)?;
            writeln!(out, "# Ellipse arcs extracted from DXF")?;
            for spline in &model.splines {
                number += 1;
                let start = point_name(spline.start());
                let end = point_name(spline.end());
                if spline.interior().is_empty() {
                    writeln!(out, "line L{number:0line_width$} {start} {end}")?;
                    continue;
                }
                let interior: Vec<String> =
                    spline.interior().iter().map(|&index| point_name(index)).collect();
                writeln!(
                    out,
                    "seqa A{number:0line_width$} pnt {}",
                    interior.join(" ")
                )?;
                writeln!(
                    out,
                    "line L{number:0line_width$} {start} {end} A{number:0line_width$}"
                )?;
            }
        }

        if !conversion.loops.is_empty() {
            let surface_width = digits(conversion.loops.len());
            writeln!(out)?;
            writeln!(out, "# Detected surfaces")?;
            for (index, edge_loop) in conversion.loops.iter().enumerate() {
                write!(out, "surf S{:0surface_width$}", index + 1)?;
                for edge in edge_loop.edges() {
                    write!(out, " L{edge:0line_width$}")?;
                }
                writeln!(out)?;
            }
        }

        writeln!(out)?;
        writeln!(out, "# Show geometry up to now")?;
        for command in ["plot pa all", "plus la all", "plus sa all", "rot y", "rot r 90", "break"] {
            writeln!(out, "{command}")?;
        }
        Ok(())
    }

    /// 以字符串形式返回完整输出。
    pub fn render(&self, conversion: &Conversion) -> String {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer, conversion).ok();
        String::from_utf8_lossy(&buffer).into_owned()
    }

    pub fn save(&self, path: &Path, conversion: &Conversion) -> Result<(), IoError> {
        let to_error = |source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(to_error)?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, conversion).map_err(to_error)?;
        writer.flush().map_err(to_error)?;
        debug!(path = %path.display(), "FBD 文件已写入");
        Ok(())
    }
}

/// 十进制位数，`0` 视为一位。
fn digits(count: usize) -> usize {
    count.max(1).to_string().len()
}

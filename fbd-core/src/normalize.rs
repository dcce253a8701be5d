use std::collections::BTreeSet;
use std::f64::consts::{PI, TAU};

use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::geometry::{Point2, Vector2};
use crate::model::{ArcEdge, ContourModel, LineEdge, PointIndex, SplineEdge};
use crate::record::EntityRecord;
use crate::registry::PointRegistry;

/// 椭圆采样的最大角步长：每 90° 至少 7 段。
pub const MAX_ELLIPSE_STEP: f64 = PI / 14.0;

/// 椭圆起止参数允许超出 `[0, 2π]` 的余量。
const PARAMETER_MARGIN: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

/// 圆弧，角度以弧度保存。
#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl Arc {
    #[inline]
    pub fn point_at(&self, angle: f64) -> Point2 {
        let (sin, cos) = angle.sin_cos();
        self.center
            .translate(Vector2::new(self.radius * cos, self.radius * sin))
    }

    #[inline]
    pub fn start_point(&self) -> Point2 {
        self.point_at(self.start_angle)
    }

    #[inline]
    pub fn end_point(&self) -> Point2 {
        self.point_at(self.end_angle)
    }
}

/// 开放多段线。是否闭合只取决于首尾顶点是否落到同一个点索引上。
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub vertices: Vec<Point2>,
}

/// 椭圆弧。`major_axis` 为相对圆心的主轴端点，参数角位于未旋转的局部坐标系。
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    pub center: Point2,
    pub major_axis: Vector2,
    pub ratio: f64,
    pub start_parameter: f64,
    pub end_parameter: f64,
}

impl Ellipse {
    /// 参数区间，保证 `end >= start`（必要时终止参数加一整圈），跨度不超过一整圈。
    pub fn parameter_range(&self) -> (f64, f64) {
        let start = self.start_parameter;
        let mut end = self.end_parameter;
        if end < start {
            end += TAU;
        }
        if (end - start).is_nan() || end - start > TAU {
            end = start + TAU;
        }
        (start, end)
    }

    /// 采样段数，至少为 1。
    pub fn segment_count(&self) -> usize {
        let (start, end) = self.parameter_range();
        let count = ((end - start) / MAX_ELLIPSE_STEP).ceil();
        if count.is_finite() && count >= 1.0 {
            count as usize
        } else {
            1
        }
    }

    /// 局部坐标 `(a·cos t, b·sin t)` 经主轴方向旋转并平移到圆心后的位置。
    pub fn point_at(&self, parameter: f64) -> Point2 {
        let (sin_t, cos_t) = parameter.sin_cos();
        let major = self.major_axis.as_vec2();
        self.center.translate(Vector2::new(
            major.x * cos_t - self.ratio * major.y * sin_t,
            major.y * cos_t + self.ratio * major.x * sin_t,
        ))
    }

    /// 按参数顺序均匀采样 `segment_count + 1` 个点，首尾恰为弧的起止点。
    pub fn samples(&self) -> Vec<Point2> {
        let (start, end) = self.parameter_range();
        let count = self.segment_count();
        let step = (end - start) / count as f64;
        (0..=count)
            .map(|i| {
                if i == count {
                    self.point_at(end)
                } else {
                    self.point_at(start + step * i as f64)
                }
            })
            .collect()
    }
}

/// 受支持的图元。
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line(Line),
    Arc(Arc),
    Polyline(Polyline),
    Ellipse(Ellipse),
}

impl Primitive {
    /// 从原始记录读取图元；不支持的类型返回 `Ok(None)`。
    pub fn from_record(record: &EntityRecord) -> Result<Option<Self>, CoreError> {
        let primitive = match record.kind() {
            "LINE" => Primitive::Line(parse_line(record)?),
            "ARC" => Primitive::Arc(parse_arc(record)?),
            "LWPOLYLINE" => Primitive::Polyline(parse_lwpolyline(record)?),
            "ELLIPSE" => Primitive::Ellipse(parse_ellipse(record)?),
            _ => return Ok(None),
        };
        Ok(Some(primitive))
    }
}

fn parse_line(record: &EntityRecord) -> Result<Line, CoreError> {
    let sx = record.scalar_f64(10, "起点 X")?;
    let sy = record.scalar_f64(20, "起点 Y")?;
    let ex = record.scalar_f64(11, "终点 X")?;
    let ey = record.scalar_f64(21, "终点 Y")?;
    Ok(Line {
        start: Point2::new(sx, sy),
        end: Point2::new(ex, ey),
    })
}

fn parse_arc(record: &EntityRecord) -> Result<Arc, CoreError> {
    let cx = record.scalar_f64(10, "圆心 X")?;
    let cy = record.scalar_f64(20, "圆心 Y")?;
    let radius = record.scalar_f64(40, "半径")?;
    let start_angle = record.scalar_f64(50, "起始角")?.to_radians();
    let end_angle = record.scalar_f64(51, "终止角")?.to_radians();
    Ok(Arc {
        center: Point2::new(cx, cy),
        radius,
        start_angle,
        end_angle,
    })
}

fn parse_lwpolyline(record: &EntityRecord) -> Result<Polyline, CoreError> {
    let xs = record.sequence_f64(10, "顶点 X")?;
    let ys = record.sequence_f64(20, "顶点 Y")?;
    if xs.len() != ys.len() {
        return Err(CoreError::malformed(
            record.kind(),
            format!("顶点 X（{} 个）与顶点 Y（{} 个）数量不一致", xs.len(), ys.len()),
        ));
    }
    Ok(Polyline {
        vertices: xs
            .into_iter()
            .zip(ys)
            .map(|(x, y)| Point2::new(x, y))
            .collect(),
    })
}

fn parse_ellipse(record: &EntityRecord) -> Result<Ellipse, CoreError> {
    let cx = record.scalar_f64(10, "圆心 X")?;
    let cy = record.scalar_f64(20, "圆心 Y")?;
    let mx = record.scalar_f64(11, "主轴向量 X")?;
    let my = record.scalar_f64(21, "主轴向量 Y")?;
    let ratio = record.scalar_f64(40, "半径比")?;
    let start_parameter = ellipse_parameter(record, 41, "起始参数", 0.0)?;
    let end_parameter = ellipse_parameter(record, 42, "终止参数", TAU)?;
    Ok(Ellipse {
        center: Point2::new(cx, cy),
        major_axis: Vector2::new(mx, my),
        ratio,
        start_parameter,
        end_parameter,
    })
}

fn ellipse_parameter(
    record: &EntityRecord,
    code: i32,
    field: &str,
    default: f64,
) -> Result<f64, CoreError> {
    let value = record.optional_f64(code, field, default)?;
    if value.is_finite() && value.abs() <= TAU + PARAMETER_MARGIN {
        Ok(value)
    } else {
        Err(CoreError::malformed(
            record.kind(),
            format!("{field}（组码 {code}）超出 [0, 2π] 范围（值：{value}）"),
        ))
    }
}

/// 单遍归一化：把图元转换为边，并通过 [`PointRegistry`] 登记所有点。
#[derive(Debug)]
pub struct Normalizer {
    registry: PointRegistry,
    lines: Vec<LineEdge>,
    arcs: Vec<ArcEdge>,
    splines: Vec<SplineEdge>,
    unsupported: BTreeSet<String>,
}

impl Normalizer {
    pub fn new(registry: PointRegistry) -> Self {
        Self {
            registry,
            lines: Vec::new(),
            arcs: Vec::new(),
            splines: Vec::new(),
            unsupported: BTreeSet::new(),
        }
    }

    /// 处理一条记录。不支持的实体类型只在首次出现时告警，随后忽略。
    pub fn push_record(&mut self, record: &EntityRecord) -> Result<(), CoreError> {
        match Primitive::from_record(record)? {
            Some(primitive) => self.push_primitive(&primitive),
            None => {
                if self.unsupported.insert(record.kind().to_string()) {
                    warn!(kind = record.kind(), "该类型的实体将被忽略");
                }
            }
        }
        Ok(())
    }

    pub fn push_primitive(&mut self, primitive: &Primitive) {
        match primitive {
            Primitive::Line(line) => {
                let start = self.registry.lookup_or_insert(line.start);
                let end = self.registry.lookup_or_insert(line.end);
                self.lines.push(LineEdge { start, end });
            }
            Primitive::Arc(arc) => {
                let center = self.registry.lookup_or_insert(arc.center);
                let start = self.registry.lookup_or_insert(arc.start_point());
                let end = self.registry.lookup_or_insert(arc.end_point());
                self.arcs.push(ArcEdge { start, end, center });
            }
            Primitive::Polyline(polyline) => {
                let indices = self.register_all(&polyline.vertices);
                self.lines.extend(
                    indices
                        .windows(2)
                        .map(|pair| LineEdge {
                            start: pair[0],
                            end: pair[1],
                        }),
                );
            }
            Primitive::Ellipse(ellipse) => {
                let samples = ellipse.samples();
                let indices = self.register_all(&samples);
                debug!(segments = samples.len() - 1, "椭圆弧已离散化");
                if let Some(spline) = SplineEdge::from_samples(&indices) {
                    self.splines.push(spline);
                }
            }
        }
    }

    fn register_all(&mut self, points: &[Point2]) -> Vec<PointIndex> {
        points
            .iter()
            .map(|point| self.registry.lookup_or_insert(*point))
            .collect()
    }

    pub fn unsupported(&self) -> impl Iterator<Item = &str> {
        self.unsupported.iter().map(String::as_str)
    }

    pub fn finish(self) -> (ContourModel, BTreeSet<String>) {
        let model = ContourModel {
            points: self.registry.into_points(),
            lines: self.lines,
            arcs: self.arcs,
            splines: self.splines,
        };
        (model, self.unsupported)
    }
}

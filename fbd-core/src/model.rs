use serde::{Deserialize, Serialize};

use crate::geometry::Point2;

/// 点在 [`ContourModel::points`] 中的位置（从 0 开始）。
pub type PointIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineEdge {
    pub start: PointIndex,
    pub end: PointIndex,
}

/// 圆弧边。半径与角度在解析端点之后不再保留，圆心仅作为引用点存在。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArcEdge {
    pub start: PointIndex,
    pub end: PointIndex,
    pub center: PointIndex,
}

/// 椭圆弧的折线近似：`[起点, 终点, 内部采样点...]`，内部点按参数递增排列。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplineEdge {
    points: Vec<PointIndex>,
}

impl SplineEdge {
    /// 由按参数顺序排列的采样点构造，至少需要两个点。
    pub fn from_samples(samples: &[PointIndex]) -> Option<Self> {
        let (&first, rest) = samples.split_first()?;
        let (&last, interior) = rest.split_last()?;
        let mut points = Vec::with_capacity(samples.len());
        points.push(first);
        points.push(last);
        points.extend_from_slice(interior);
        Some(Self { points })
    }

    #[inline]
    pub fn start(&self) -> PointIndex {
        self.points[0]
    }

    #[inline]
    pub fn end(&self) -> PointIndex {
        self.points[1]
    }

    #[inline]
    pub fn interior(&self) -> &[PointIndex] {
        &self.points[2..]
    }

    #[inline]
    pub fn as_slice(&self) -> &[PointIndex] {
        &self.points
    }
}

/// 归一化后的轮廓：去重点集与三类边。构建完成后只读。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContourModel {
    pub points: Vec<Point2>,
    pub lines: Vec<LineEdge>,
    pub arcs: Vec<ArcEdge>,
    pub splines: Vec<SplineEdge>,
}

impl ContourModel {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.lines.len() + self.arcs.len() + self.splines.len()
    }

    /// 参与闭环检测的端点对，依次为直线、圆弧、样条。位置 `i` 对应编号 `i + 1`。
    pub fn loop_edges(&self) -> Vec<(PointIndex, PointIndex)> {
        self.lines
            .iter()
            .map(|line| (line.start, line.end))
            .chain(self.arcs.iter().map(|arc| (arc.start, arc.end)))
            .chain(
                self.splines
                    .iter()
                    .map(|spline| (spline.start(), spline.end())),
            )
            .collect()
    }
}

/// 由 3 到 5 条边组成的闭环，记录的是边在 [`ContourModel::loop_edges`] 中的编号（从 1 开始）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeLoop {
    edges: Vec<usize>,
}

impl EdgeLoop {
    pub fn new(edges: Vec<usize>) -> Self {
        Self { edges }
    }

    #[inline]
    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spline_edge_puts_endpoints_first() {
        let spline = SplineEdge::from_samples(&[4, 5, 6, 7]).expect("spline");
        assert_eq!(spline.as_slice(), &[4, 7, 5, 6]);
        assert_eq!(spline.start(), 4);
        assert_eq!(spline.end(), 7);
        assert_eq!(spline.interior(), &[5, 6]);

        let short = SplineEdge::from_samples(&[1, 2]).expect("two samples");
        assert!(short.interior().is_empty());
        assert!(SplineEdge::from_samples(&[3]).is_none());
    }

    #[test]
    fn loop_edges_concatenate_in_fixed_order() {
        let model = ContourModel {
            points: vec![Point2::new(0.0, 0.0); 6],
            lines: vec![LineEdge { start: 0, end: 1 }],
            arcs: vec![ArcEdge {
                start: 1,
                end: 2,
                center: 3,
            }],
            splines: vec![SplineEdge::from_samples(&[2, 4, 5, 0]).expect("spline")],
        };
        assert_eq!(model.loop_edges(), vec![(0, 1), (1, 2), (2, 0)]);
        assert_eq!(model.edge_count(), 3);
        assert!(!model.is_empty());
    }
}

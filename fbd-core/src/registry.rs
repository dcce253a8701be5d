use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Point2;
use crate::model::PointIndex;

/// 默认的坐标合并容差。
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

// 网格坐标超过此范围时无法精确转换为 i64，改由溢出列表处理。
const MAX_CELL_COORD: f64 = 4.0e15;

/// 点查找方式。两者结果完全一致，网格仅减少比较次数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupStrategy {
    Linear,
    #[default]
    Grid,
}

/// 按容差去重的点集合。索引按首次出现顺序分配，一经分配永不改变。
///
/// 两点在 X、Y 上的差值都严格小于容差时视为同一点；若多个已有点都满足条件，
/// 返回最早插入的那个。容差不做校验：为 0 时不合并任何点，过大时会合并无关点。
#[derive(Debug, Clone)]
pub struct PointRegistry {
    tolerance: f64,
    points: Vec<Point2>,
    grid: Option<GridIndex>,
}

impl PointRegistry {
    pub fn new(tolerance: f64) -> Self {
        Self::with_strategy(tolerance, LookupStrategy::default())
    }

    pub fn with_strategy(tolerance: f64, strategy: LookupStrategy) -> Self {
        let grid = match strategy {
            LookupStrategy::Linear => None,
            LookupStrategy::Grid => GridIndex::new(tolerance),
        };
        Self {
            tolerance,
            points: Vec::new(),
            grid,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    #[inline]
    pub fn get(&self, index: PointIndex) -> Option<Point2> {
        self.points.get(index).copied()
    }

    /// 查找容差范围内最早插入的点。
    pub fn find(&self, point: Point2) -> Option<PointIndex> {
        let candidates = self.grid.as_ref().and_then(|grid| grid.candidates(point));
        match candidates {
            Some(candidates) => candidates
                .into_iter()
                .filter(|&index| self.points[index].within(point, self.tolerance))
                .min(),
            None => self
                .points
                .iter()
                .position(|existing| existing.within(point, self.tolerance)),
        }
    }

    /// 返回匹配点的索引；没有匹配时追加新点并返回其索引。
    pub fn lookup_or_insert(&mut self, point: Point2) -> PointIndex {
        if let Some(index) = self.find(point) {
            return index;
        }
        let index = self.points.len();
        self.points.push(point);
        if let Some(grid) = self.grid.as_mut() {
            grid.insert(point, index);
        }
        index
    }

    pub fn into_points(self) -> Vec<Point2> {
        self.points
    }
}

/// 边长为两倍容差的方格索引。匹配点的格坐标最多相差 1，因此只需检查 3×3 邻域；
/// 无法计算格坐标的点放入溢出列表，每次查询都会检查。
#[derive(Debug, Clone)]
struct GridIndex {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<PointIndex>>,
    overflow: Vec<PointIndex>,
}

impl GridIndex {
    fn new(tolerance: f64) -> Option<Self> {
        let cell_size = tolerance * 2.0;
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return None;
        }
        Some(Self {
            cell_size,
            cells: HashMap::new(),
            overflow: Vec::new(),
        })
    }

    fn cell_of(&self, point: Point2) -> Option<(i64, i64)> {
        let cx = (point.x() / self.cell_size).floor();
        let cy = (point.y() / self.cell_size).floor();
        let in_range = |value: f64| value.is_finite() && value.abs() < MAX_CELL_COORD;
        if in_range(cx) && in_range(cy) {
            Some((cx as i64, cy as i64))
        } else {
            None
        }
    }

    fn insert(&mut self, point: Point2, index: PointIndex) {
        match self.cell_of(point) {
            Some(cell) => self.cells.entry(cell).or_default().push(index),
            None => self.overflow.push(index),
        }
    }

    /// 可能匹配的索引；返回 `None` 表示需要退回全量扫描。
    fn candidates(&self, point: Point2) -> Option<Vec<PointIndex>> {
        let (cx, cy) = self.cell_of(point)?;
        let mut found = self.overflow.clone();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    found.extend_from_slice(bucket);
                }
            }
        }
        Some(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn both(tolerance: f64) -> [PointRegistry; 2] {
        [
            PointRegistry::with_strategy(tolerance, LookupStrategy::Linear),
            PointRegistry::with_strategy(tolerance, LookupStrategy::Grid),
        ]
    }

    #[test]
    fn merges_within_tolerance() {
        for mut registry in both(1e-4) {
            let a = registry.lookup_or_insert(Point2::new(0.0, 0.0));
            let b = registry.lookup_or_insert(Point2::new(1e-5, 1e-5));
            assert_eq!(a, b);
            assert_eq!(registry.len(), 1);
        }
        for mut registry in both(1e-6) {
            let a = registry.lookup_or_insert(Point2::new(0.0, 0.0));
            let b = registry.lookup_or_insert(Point2::new(1e-5, 1e-5));
            assert_ne!(a, b);
            assert_eq!(registry.len(), 2);
        }
    }

    #[test]
    fn indices_follow_first_appearance() {
        for mut registry in both(1e-4) {
            let p = registry.lookup_or_insert(Point2::new(5.0, 5.0));
            let q = registry.lookup_or_insert(Point2::new(-3.0, 2.0));
            assert_eq!((p, q), (0, 1));
            assert_eq!(registry.lookup_or_insert(Point2::new(5.0, 5.0)), 0);
            assert_eq!(registry.lookup_or_insert(Point2::new(-3.0, 2.0)), 1);
            assert_eq!(registry.get(1), Some(Point2::new(-3.0, 2.0)));
            assert_eq!(registry.get(2), None);
        }
    }

    #[test]
    fn earliest_match_wins_when_several_points_qualify() {
        for mut registry in both(1.0) {
            // 两点彼此相距 1.2，互不合并；查询点与两者的距离都小于 1。
            registry.lookup_or_insert(Point2::new(0.6, 0.0));
            registry.lookup_or_insert(Point2::new(-0.6, 0.0));
            assert_eq!(registry.len(), 2);
            assert_eq!(registry.lookup_or_insert(Point2::new(0.0, 0.0)), 0);

            let mut reversed = PointRegistry::with_strategy(1.0, LookupStrategy::Grid);
            reversed.lookup_or_insert(Point2::new(-0.6, 0.0));
            reversed.lookup_or_insert(Point2::new(0.6, 0.0));
            assert_eq!(reversed.lookup_or_insert(Point2::new(0.0, 0.0)), 0);
        }
    }

    #[test]
    fn zero_tolerance_never_merges() {
        for mut registry in both(0.0) {
            let a = registry.lookup_or_insert(Point2::new(1.0, 1.0));
            let b = registry.lookup_or_insert(Point2::new(1.0, 1.0));
            assert_ne!(a, b);
            assert_eq!(registry.len(), 2);
        }
    }

    #[test]
    fn huge_coordinates_fall_back_to_scan() {
        for mut registry in both(1e-4) {
            let far = registry.lookup_or_insert(Point2::new(1e300, -1e300));
            let near = registry.lookup_or_insert(Point2::new(0.0, 0.0));
            assert_eq!(registry.lookup_or_insert(Point2::new(1e300, -1e300)), far);
            assert_eq!(registry.lookup_or_insert(Point2::new(5e-5, 0.0)), near);
            let nan = registry.lookup_or_insert(Point2::new(f64::NAN, 0.0));
            assert_eq!(nan, 2);
            assert_eq!(registry.lookup_or_insert(Point2::new(f64::NAN, 0.0)), 3);
        }
    }

    #[test]
    fn grid_and_linear_agree_on_dense_input() {
        let [mut linear, mut grid] = both(0.3);
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let x = (seed % 1000) as f64 / 100.0 - 5.0;
            let y = ((seed >> 20) % 1000) as f64 / 100.0 - 5.0;
            let point = Point2::new(x, y);
            assert_eq!(linear.lookup_or_insert(point), grid.lookup_or_insert(point));
        }
        assert_eq!(linear.points(), grid.points());
    }
}

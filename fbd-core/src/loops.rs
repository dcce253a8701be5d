use std::collections::HashMap;
use std::ops::RangeInclusive;

use tracing::debug;

use crate::model::{EdgeLoop, PointIndex};

/// 检测的闭环边数范围。
pub const LOOP_LENGTHS: RangeInclusive<usize> = 3..=5;

/// 在端点对列表中寻找 3~5 条边组成的闭环。
///
/// 候选组合中每个点索引都恰好出现两次即视为闭环（按端点出现次数计，退化边 `(a, a)`
/// 计两次）。这一判定是必要而非充分条件：两个互不相连的小环也可能满足。
/// 结果按长度升序、同长度内按组合生成顺序排列；编号取该端点对在列表中首次出现的位置（从 1 开始）。
pub fn find_loops(edges: &[(PointIndex, PointIndex)]) -> Vec<EdgeLoop> {
    let mut occurrences: HashMap<PointIndex, usize> = HashMap::new();
    for &(start, end) in edges {
        *occurrences.entry(start).or_default() += 1;
        *occurrences.entry(end).or_default() += 1;
    }

    // 端点总出现次数不足两次的边不可能属于任何闭环。
    let candidates: Vec<usize> = edges
        .iter()
        .enumerate()
        .filter(|(_, (start, end))| occurrences[start] >= 2 && occurrences[end] >= 2)
        .map(|(position, _)| position)
        .collect();

    let mut first_position: HashMap<(PointIndex, PointIndex), usize> = HashMap::new();
    for (position, edge) in edges.iter().enumerate() {
        first_position.entry(*edge).or_insert(position);
    }

    let mut loops = Vec::new();
    for length in LOOP_LENGTHS {
        for combination in Combinations::new(candidates.len(), length) {
            let chosen: Vec<(PointIndex, PointIndex)> = combination
                .iter()
                .map(|&slot| edges[candidates[slot]])
                .collect();
            if is_closed(&chosen) {
                loops.push(EdgeLoop::new(
                    chosen
                        .iter()
                        .map(|edge| first_position[edge] + 1)
                        .collect(),
                ));
            }
        }
    }
    debug!(
        edges = edges.len(),
        candidates = candidates.len(),
        loops = loops.len(),
        "闭环检测完成"
    );
    loops
}

/// 每个点索引是否恰好出现两次。
fn is_closed(edges: &[(PointIndex, PointIndex)]) -> bool {
    let mut counts: Vec<(PointIndex, usize)> = Vec::with_capacity(edges.len() * 2);
    for &(start, end) in edges {
        for point in [start, end] {
            match counts.iter_mut().find(|(index, _)| *index == point) {
                Some((_, count)) => *count += 1,
                None => counts.push((point, 1)),
            }
        }
    }
    !counts.is_empty() && counts.iter().all(|&(_, count)| count == 2)
}

/// 按字典序生成 `0..n` 中取 `k` 个元素的全部组合。
struct Combinations {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            indices: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }
        let mut i = self.k;
        loop {
            if i == 0 {
                self.done = true;
                return None;
            }
            i -= 1;
            if self.indices[i] != i + self.n - self.k {
                break;
            }
        }
        self.indices[i] += 1;
        for j in i + 1..self.k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}

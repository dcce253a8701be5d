use serde::Serialize;
use tracing::{info, warn};

use crate::errors::CoreError;
use crate::loops::find_loops;
use crate::model::{ContourModel, EdgeLoop};
use crate::normalize::Normalizer;
use crate::record::{EntityRecord, records_on_layer};
use crate::registry::{DEFAULT_TOLERANCE, LookupStrategy, PointRegistry};

/// 默认读取的轮廓图层。
pub const DEFAULT_LAYER: &str = "contour";

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    pub tolerance: f64,
    pub layer: String,
    pub strategy: LookupStrategy,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            layer: DEFAULT_LAYER.to_string(),
            strategy: LookupStrategy::default(),
        }
    }
}

/// 一次转换的全部结果。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub model: ContourModel,
    pub loops: Vec<EdgeLoop>,
    /// 被忽略的实体类型，按名称排序。
    pub unsupported: Vec<String>,
}

/// 过滤图层、归一化图元并检测闭环。
///
/// 图层为空只记录告警，返回空模型；任一记录缺少必需字段则整体失败。
pub fn convert<'a, I>(records: I, options: &ConvertOptions) -> Result<Conversion, CoreError>
where
    I: IntoIterator<Item = &'a EntityRecord>,
{
    let registry = PointRegistry::with_strategy(options.tolerance, options.strategy);
    let mut normalizer = Normalizer::new(registry);
    let mut on_layer = 0usize;
    for record in records_on_layer(records, &options.layer) {
        on_layer += 1;
        normalizer.push_record(record)?;
    }
    if on_layer == 0 {
        warn!(layer = %options.layer, "图层中没有任何实体");
    }

    let (model, unsupported) = normalizer.finish();
    let loops = find_loops(&model.loop_edges());
    info!(
        entities = on_layer,
        points = model.points.len(),
        lines = model.lines.len(),
        arcs = model.arcs.len(),
        splines = model.splines.len(),
        loops = loops.len(),
        "轮廓转换完成"
    );
    Ok(Conversion {
        model,
        loops,
        unsupported: unsupported.into_iter().collect(),
    })
}

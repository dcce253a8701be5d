pub mod convert;
pub mod loops;
pub mod model;
pub mod normalize;
pub mod record;
pub mod registry;

pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示。绘图中的 X/Y 在输出时对应 FBD 的 Y/Z。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        /// 沿 `offset` 平移。
        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        /// 两点在两个坐标轴上的差值是否都严格小于 `tolerance`。
        #[inline]
        pub fn within(self, other: Point2, tolerance: f64) -> bool {
            (self.0.x - other.0.x).abs() < tolerance && (self.0.y - other.0.y).abs() < tolerance
        }
    }

    /// 二维向量，用于椭圆主轴和相对圆心的偏移。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }
}

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum CoreError {
        /// 必需的组码缺失、重复或无法解析。整个转换因此中止。
        #[error("{kind} 实体记录无效: {message}")]
        MalformedRecord { kind: String, message: String },
    }

    impl CoreError {
        pub fn malformed(kind: impl Into<String>, message: impl Into<String>) -> Self {
            Self::MalformedRecord {
                kind: kind.into(),
                message: message.into(),
            }
        }
    }
}

pub use convert::{Conversion, ConvertOptions, convert};
pub use errors::CoreError;
pub use model::{ArcEdge, ContourModel, EdgeLoop, LineEdge, PointIndex, SplineEdge};
pub use record::{EntityRecord, GroupValue};
pub use registry::{LookupStrategy, PointRegistry};

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// 图层名称所在的组码。
pub const LAYER_CODE: i32 = 8;
/// 未声明图层时 DXF 默认归入的图层。
pub const DEFAULT_LAYER: &str = "0";

/// 单个绘图实体的原始记录：实体类型加上按文件顺序保存的 `(组码, 值)` 对。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    kind: String,
    groups: Vec<(i32, String)>,
}

/// 按组码查询的结果。同一组码可能出现零次、一次或多次，调用方必须显式区分。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupValue<'a> {
    Missing,
    Single(&'a str),
    Multiple(Vec<&'a str>),
}

impl<'a> GroupValue<'a> {
    pub fn len(&self) -> usize {
        match self {
            GroupValue::Missing => 0,
            GroupValue::Single(_) => 1,
            GroupValue::Multiple(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, GroupValue::Missing)
    }

    pub fn into_vec(self) -> Vec<&'a str> {
        match self {
            GroupValue::Missing => Vec::new(),
            GroupValue::Single(value) => vec![value],
            GroupValue::Multiple(values) => values,
        }
    }
}

impl EntityRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_groups<I, S>(kind: impl Into<String>, groups: I) -> Self
    where
        I: IntoIterator<Item = (i32, S)>,
        S: Into<String>,
    {
        Self {
            kind: kind.into(),
            groups: groups
                .into_iter()
                .map(|(code, value)| (code, value.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, code: i32, value: impl Into<String>) {
        self.groups.push((code, value.into()));
    }

    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[inline]
    pub fn groups(&self) -> &[(i32, String)] {
        &self.groups
    }

    pub fn values(&self, code: i32) -> GroupValue<'_> {
        let mut matches = self
            .groups
            .iter()
            .filter(|(group, _)| *group == code)
            .map(|(_, value)| value.as_str());
        let Some(first) = matches.next() else {
            return GroupValue::Missing;
        };
        match matches.next() {
            None => GroupValue::Single(first),
            Some(second) => {
                let mut values = vec![first, second];
                values.extend(matches);
                GroupValue::Multiple(values)
            }
        }
    }

    /// 实体所在图层；取第一个组码 8，缺失时归入 `"0"`。
    pub fn layer(&self) -> &str {
        self.groups
            .iter()
            .find(|(code, _)| *code == LAYER_CODE)
            .map(|(_, value)| value.trim())
            .unwrap_or(DEFAULT_LAYER)
    }

    /// 读取恰好出现一次的数值组码。
    pub fn scalar_f64(&self, code: i32, field: &str) -> Result<f64, CoreError> {
        match self.values(code) {
            GroupValue::Single(raw) => self.parse_f64(raw, code, field),
            GroupValue::Missing => Err(CoreError::malformed(
                &self.kind,
                format!("缺少{field}（组码 {code}）"),
            )),
            GroupValue::Multiple(values) => Err(CoreError::malformed(
                &self.kind,
                format!("{field}（组码 {code}）重复出现 {} 次", values.len()),
            )),
        }
    }

    /// 与 [`scalar_f64`](Self::scalar_f64) 相同，但组码缺失时返回 `default`。
    pub fn optional_f64(&self, code: i32, field: &str, default: f64) -> Result<f64, CoreError> {
        if self.values(code).is_empty() {
            Ok(default)
        } else {
            self.scalar_f64(code, field)
        }
    }

    /// 读取可重复的数值组码，保持文件中的出现顺序。
    pub fn sequence_f64(&self, code: i32, field: &str) -> Result<Vec<f64>, CoreError> {
        self.values(code)
            .into_vec()
            .into_iter()
            .map(|raw| self.parse_f64(raw, code, field))
            .collect()
    }

    fn parse_f64(&self, raw: &str, code: i32, field: &str) -> Result<f64, CoreError> {
        raw.trim().parse::<f64>().map_err(|_| {
            CoreError::malformed(
                &self.kind,
                format!("{field}（组码 {code}）解析失败（值：\"{raw}\"）"),
            )
        })
    }
}

/// 只保留指定图层上的实体，顺序不变。
pub fn records_on_layer<'a, I>(records: I, layer: &str) -> impl Iterator<Item = &'a EntityRecord>
where
    I: IntoIterator<Item = &'a EntityRecord>,
{
    records
        .into_iter()
        .filter(move |record| record.layer() == layer)
}

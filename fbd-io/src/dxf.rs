//! DXF 组码读取与 ENTITIES 段切分。
//!
//! 这里不解释任何实体字段，只把 `ENTITIES` 段中的内容按组码 0 切分为
//! [`EntityRecord`]，字段含义由 `fbd_core::normalize` 负责。

use fbd_core::record::EntityRecord;

use crate::IoError;

#[derive(Debug)]
enum DxfError {
    Invalid { message: String },
}

impl DxfError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

impl From<DxfError> for IoError {
    fn from(err: DxfError) -> Self {
        match err {
            DxfError::Invalid { message } => IoError::InvalidDocument(message),
        }
    }
}

/// 解析整份 DXF 文本，返回 ENTITIES 段中的全部实体记录（按文件顺序）。
pub fn extract_records(source: &str) -> Result<Vec<EntityRecord>, IoError> {
    Ok(RecordExtractor::new(source).extract()?)
}

struct RecordExtractor<'a> {
    reader: DxfReader<'a>,
}

impl<'a> RecordExtractor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: DxfReader::new(source),
        }
    }

    fn extract(mut self) -> Result<Vec<EntityRecord>, DxfError> {
        let mut records = None;
        while let Some((code, value)) = self.reader.next_pair()? {
            if code == 999 {
                continue;
            }
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "意外的组码 {code}（期望 0 表示 SECTION/EOF）"
                )));
            }
            match value.trim() {
                "SECTION" => {
                    let (name_code, name) = self
                        .reader
                        .next_pair()?
                        .ok_or_else(|| DxfError::invalid("SECTION 缺少名称（组码 2）"))?;
                    if name_code != 2 {
                        return Err(DxfError::invalid(format!(
                            "SECTION 名称使用了组码 {name_code}（期望 2）"
                        )));
                    }
                    match name.trim() {
                        "ENTITIES" => {
                            let section = self.parse_entities()?;
                            records.get_or_insert_with(Vec::new).extend(section);
                        }
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                unexpected => {
                    return Err(DxfError::invalid(format!(
                        "意外的标记 {unexpected}，期望 SECTION 或 EOF"
                    )));
                }
            }
        }
        records.ok_or_else(|| DxfError::invalid("文件中没有 ENTITIES 段"))
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) if value.trim() == "ENDSEC" => break,
                Some(_) => continue,
                None => {
                    return Err(DxfError::invalid("SECTION 未找到 ENDSEC 终止标记"));
                }
            }
        }
        Ok(())
    }

    fn parse_entities(&mut self) -> Result<Vec<EntityRecord>, DxfError> {
        let mut records = Vec::new();
        loop {
            let (code, value) = match self.reader.next_pair()? {
                Some(pair) => pair,
                None => return Err(DxfError::invalid("ENTITIES 段提前结束")),
            };
            if code != 0 {
                return Err(DxfError::invalid(format!(
                    "ENTITIES 段遇到组码 {code}（期望 0 表示实体起始）"
                )));
            }

            match value.trim() {
                "ENDSEC" => break,
                kind => {
                    let mut record = EntityRecord::new(kind);
                    self.read_entity_body(&mut record)?;
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    fn read_entity_body(&mut self, record: &mut EntityRecord) -> Result<(), DxfError> {
        loop {
            match self.reader.next_pair()? {
                Some((0, value)) => {
                    self.reader.put_back((0, value));
                    break;
                }
                Some((code, value)) => record.push(code, value),
                None => {
                    return Err(DxfError::invalid(format!(
                        "{} 实体未正确结束",
                        record.kind()
                    )));
                }
            }
        }
        Ok(())
    }
}

struct DxfReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<(i32, String)>,
    line_number: usize,
}

impl<'a> DxfReader<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    fn next_pair(&mut self) -> Result<Option<(i32, String)>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        // 文件末尾的空行不构成组码。
        let code_line = loop {
            match self.lines.next() {
                Some(line) => {
                    self.line_number += 1;
                    if !line.trim().is_empty() {
                        break line;
                    }
                    if self.remaining_blank() {
                        return Ok(None);
                    }
                    return Err(DxfError::invalid(format!(
                        "第 {} 行的组码为空",
                        self.line_number
                    )));
                }
                None => return Ok(None),
            }
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::invalid(format!(
                    "文件在第 {} 行结束，缺少与组码对应的值行",
                    self.line_number
                )));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::invalid(format!(
                "第 {} 行的组码 \"{}\" 无法解析为整数",
                self.line_number - 1,
                code_line.trim()
            ))
        })?;
        let value = value_line.trim_end().to_string();
        Ok(Some((code, value)))
    }

    fn remaining_blank(&self) -> bool {
        self.lines.clone().all(|line| line.trim().is_empty())
    }

    fn put_back(&mut self, pair: (i32, String)) {
        debug_assert!(self.buffer.is_none(), "DXF pair 只能回退一次");
        self.buffer = Some(pair);
    }
}

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// 将 DXF 文件中 “contour” 图层的直线、圆弧、多段线与椭圆弧转换为 CalculiX `cgx` 可读取的 FBD 文件。
///
/// DXF 的 XY 平面对应 FBD 的 YZ 平面，忽略所有 Z 坐标。检测到由 3~5 条边组成的闭环时，
/// 额外生成对应的曲面。输出可作为后续拉伸、划分网格的起点。
#[derive(Debug, Parser)]
#[command(name = "dxf2fbd", version, disable_version_flag = true)]
pub struct Cli {
    /// 显示版本号
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// 视为同一点的最大坐标差（默认 1e-4）
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// DXF 坐标到 CalculiX 坐标的缩放系数（默认 0.001，毫米转米）
    #[arg(short, long, allow_negative_numbers = true)]
    pub scale: Option<f64>,

    /// 读取的图层名称（默认 contour）
    #[arg(long)]
    pub layer: Option<String>,

    /// 日志等级
    #[arg(long, value_enum)]
    pub log: Option<LogLevel>,

    /// 配置文件路径，未指定时自动查找
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 输入 DXF 文件
    pub infile: PathBuf,

    /// 输出 FBD 文件，省略时写到标准输出
    pub outfile: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 配置文件中的等级写法转换为 `EnvFilter` 指令；`warning` 视为 `warn`。
pub fn normalize_directive(level: &str) -> String {
    match level.trim() {
        "warning" => "warn".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_positional_and_overrides() {
        let cli = Cli::try_parse_from([
            "dxf2fbd", "-t", "0.001", "-s", "1", "--log", "warning", "part.dxf", "part.fbd",
        ])
        .expect("parse");
        assert_eq!(cli.tolerance, Some(0.001));
        assert_eq!(cli.scale, Some(1.0));
        assert_eq!(cli.log, Some(LogLevel::Warning));
        assert_eq!(cli.infile, PathBuf::from("part.dxf"));
        assert_eq!(cli.outfile, Some(PathBuf::from("part.fbd")));
        assert!(cli.layer.is_none());
    }

    #[test]
    fn lowercase_v_prints_version() {
        for flag in ["-v", "--version"] {
            let err = Cli::try_parse_from(["dxf2fbd", flag]).expect_err(flag);
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
        }
    }

    #[test]
    fn infile_is_required() {
        assert!(Cli::try_parse_from(["dxf2fbd"]).is_err());
        assert!(Cli::try_parse_from(["dxf2fbd", "--log", "verbose", "a.dxf"]).is_err());
    }

    #[test]
    fn warning_maps_to_warn() {
        assert_eq!(LogLevel::Warning.directive(), "warn");
        assert_eq!(normalize_directive("warning"), "warn");
        assert_eq!(normalize_directive("fbd_core=debug"), "fbd_core=debug");
    }
}

use anyhow::{bail, Context};
use dotenv::dotenv;
use env_logger::Env;
use std::env;
use std::fs;
use std::path::PathBuf;

use phi_chart_pipeline::config::{AppConfig, CONFIG};
use phi_chart_pipeline::services::{ChartService, LocalFileStorage};

const USAGE: &str = "用法: phi-chart-pipeline <谱面文件> [--out 目录] [--config 配置文件]";

struct Args {
    chart: PathBuf,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut chart = None;
    let mut out = None;
    let mut config = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => match args.next() {
                Some(dir) => out = Some(PathBuf::from(dir)),
                None => bail!("--out 缺少目录参数\n{USAGE}"),
            },
            "--config" => match args.next() {
                Some(path) => config = Some(PathBuf::from(path)),
                None => bail!("--config 缺少文件参数\n{USAGE}"),
            },
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ if chart.is_none() => chart = Some(PathBuf::from(arg)),
            _ => bail!("多余的参数: {arg}\n{USAGE}"),
        }
    }
    let Some(chart) = chart else {
        bail!("{USAGE}");
    };
    Ok(Args { chart, out, config })
}

fn main() -> anyhow::Result<()> {
    // 加载.env文件
    dotenv().ok();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => CONFIG.as_ref().clone(),
    };

    // 初始化日志
    env_logger::init_from_env(Env::default().default_filter_or(config.log_level.as_str()));

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(&config.storage_dir));
    log::info!("谱面保存目录: {}", out.display());

    let bytes = fs::read(&args.chart)
        .with_context(|| format!("无法读取谱面文件 {}", args.chart.display()))?;
    let file_name = args
        .chart
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let service = ChartService::new(LocalFileStorage::new(out));
    let uploaded = service
        .process_upload(&file_name, &bytes)
        .with_context(|| format!("谱面 {} 处理失败", args.chart.display()))?;

    println!("{}", serde_json::to_string_pretty(&uploaded)?);
    Ok(())
}

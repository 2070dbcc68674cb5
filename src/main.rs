//! wappalyzer-core 命令行入口

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wappalyzer_core::collector::dns::host_of;
use wappalyzer_core::{
    ConfigManager, DnsCollector, HttpCollector, IconReader, PageCapture, TechDetector,
};

#[derive(Parser, Debug)]
#[command(name = "wappalyzer-core", version, about = "Wappalyzer 指纹检测")]
struct Cli {
    /// Wappalyzer 规则目录
    #[arg(long, global = true, default_value = "wappalyzer")]
    rules: PathBuf,

    /// 规则缓存文件
    #[arg(long, global = true, default_value = "wappalyzer_rules.mp")]
    cache: PathBuf,

    /// 不读写规则缓存
    #[arg(long, global = true)]
    no_cache: bool,

    /// 详细日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 检测目标站点，或回放离线采集文件
    Detect {
        /// 目标 URL
        url: Option<String>,

        /// 离线采集文件（JSON）
        #[arg(long, conflicts_with = "url")]
        capture: Option<PathBuf>,

        /// 查询 DNS 记录
        #[arg(long)]
        dns: bool,

        /// 图标URL前缀
        #[arg(long, default_value = "/geticon?icon=")]
        icon_url: String,

        /// HTTP/DNS 超时（秒）
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// 模式忽略大小写
        #[arg(long)]
        ignore_case: bool,

        /// 输出诊断信息
        #[arg(long)]
        diagnostics: bool,
    },
    /// 将技术图标写入文件
    Icon {
        /// 图标文件名
        name: String,

        /// 输出路径
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Command::Detect {
            url,
            capture,
            dns,
            icon_url,
            timeout,
            ignore_case,
            diagnostics,
        } => {
            let config = ConfigManager::custom()
                .rule_dir(cli.rules)
                .rule_cache_path(cli.cache)
                .use_cache(!cli.no_cache)
                .icon_url(icon_url)
                .http_timeout(timeout)
                .case_insensitive(ignore_case)
                .verbose(cli.verbose)
                .build();

            let page = match (url, capture) {
                (_, Some(path)) => {
                    let content = tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("读取采集文件失败：{}", path.display()))?;
                    PageCapture::from_json(&content)?
                }
                (Some(url), None) => {
                    let http = HttpCollector::new(&config)?;
                    let mut page = http.fetch_page(&url).await?;
                    match http.fetch_robots(&url).await {
                        Ok(robots) => page.robots = Some(robots),
                        Err(e) => warn!("robots.txt 抓取失败：{}", e),
                    }
                    if dns {
                        let host = host_of(&page.url)?;
                        page.dns = DnsCollector::new(&config).lookup(&host).await;
                    }
                    page
                }
                (None, None) => bail!("需要指定目标 URL 或 --capture 采集文件"),
            };

            let detector = TechDetector::new(config).await?;
            let session = detector.session();
            page.feed(&session);

            let report = session.finish();
            info!("检测完成：{}，识别技术数：{}", page.url, report.technologies.len());
            let output = if diagnostics {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string_pretty(&report.technologies)?
            };
            println!("{}", output);
        }
        Command::Icon { name, output } => {
            let icon = IconReader::new(&cli.rules).read(&name).await?;
            tokio::fs::write(&output, &icon.bytes)
                .await
                .with_context(|| format!("写入图标失败：{}", output.display()))?;
            info!("图标已写入：{}（{}）", output.display(), icon.content_type);
        }
    }

    Ok(())
}

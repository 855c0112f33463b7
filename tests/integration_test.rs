use chrono::{Duration, NaiveDate};
use notion_page_export::browser::BrowserSession;
use notion_page_export::infrastructure::PageDriver;
use notion_page_export::models::OutputFormat;
use notion_page_export::services::{cache_gate, storage};
use notion_page_export::{config, logger};

const SINGLE_PAGE_CONFIG: &str = r#"
config:
  s3_bucket: qa-notion-pages
  s3_prefix: notion-pages
pages:
  - url: https://www.notion.so/ws/git-0123456789abcdef0123456789abcdef
    name: git
    output_formats: [markdown]
"#;

/// 场景：一个页面、仅 markdown、存储无历史对象
/// → 恰好产出一个 markdown 键，布局为 {prefix}/git/git_{date}_{time}.md
#[test]
fn test_single_markdown_job_first_run() {
    let (global, jobs) = config::parse(SINGLE_PAGE_CONFIG, "pages_config.yaml").unwrap();
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.formats, vec![OutputFormat::Markdown]);

    let now = NaiveDate::from_ymd_opt(2026, 8, 29)
        .unwrap()
        .and_hms_opt(10, 15, 30)
        .unwrap();

    // 首次运行：无历史对象 → 必须导出
    let decision = cache_gate::evaluate(
        &[],
        job,
        OutputFormat::Markdown,
        now,
        global.refresh_hours,
        global.force_refresh,
    );
    assert!(decision.should_export);

    let key = storage::object_key(job, &storage::stamp(now), OutputFormat::Markdown);
    assert_eq!(key, "notion-pages/git/git_20260829_101530.md");
}

/// 场景：同一页面在新鲜窗口内重跑且未强制刷新
/// → 不产生新产物，判定为跳过
#[test]
fn test_single_markdown_job_rerun_within_window() {
    let (global, jobs) = config::parse(SINGLE_PAGE_CONFIG, "pages_config.yaml").unwrap();
    let job = &jobs[0];

    let first_run = NaiveDate::from_ymd_opt(2026, 8, 29)
        .unwrap()
        .and_hms_opt(10, 15, 30)
        .unwrap();
    let existing_key = storage::object_key(job, &storage::stamp(first_run), OutputFormat::Markdown);

    // 两小时后重跑，窗口 24 小时
    let rerun = first_run + Duration::hours(2);
    let decision = cache_gate::evaluate(
        &[existing_key],
        job,
        OutputFormat::Markdown,
        rerun,
        global.refresh_hours,
        global.force_refresh,
    );
    assert!(!decision.should_export);

    // 窗口过后再跑则必须重新导出
    let late_rerun = first_run + Duration::hours(25);
    let decision = cache_gate::evaluate(
        &[storage::object_key(job, &storage::stamp(first_run), OutputFormat::Markdown)],
        job,
        OutputFormat::Markdown,
        late_rerun,
        global.refresh_hours,
        false,
    );
    assert!(decision.should_export);
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_launch_with_persistent_profile() {
    // 初始化日志
    logger::init();

    // 启动带持久化配置目录的浏览器
    let session = BrowserSession::launch("/tmp/chrome-notion-profile-test")
        .await
        .expect("启动浏览器失败");

    let page = session.new_page().await.expect("创建页面失败");
    let driver = PageDriver::new(page, std::time::Duration::from_secs(10));

    driver
        .goto("https://www.notion.so")
        .await
        .expect("导航失败");

    let title = driver.title().await.expect("获取标题失败");
    println!("页面标题: {}", title);

    session.close().await.expect("关闭浏览器失败");
}

#[tokio::test]
#[ignore]
async fn test_full_export_run() {
    // 初始化日志
    logger::init();

    // 加载配置
    // 注意：请根据实际情况准备 pages_config.yaml 和 AWS 凭证
    let path = config::config_path();
    let (global, jobs) = config::load(&path).expect("加载配置失败");

    let stats = notion_page_export::App::initialize(global, jobs)
        .await
        .expect("初始化应用失败")
        .run()
        .await
        .expect("运行失败");

    println!(
        "上传 {} / 跳过 {} / 失败 {}",
        stats.uploaded, stats.skipped, stats.failed
    );
    assert_eq!(stats.failed, 0, "不应有失败的任务");
}

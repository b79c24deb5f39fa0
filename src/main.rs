use clap::Parser;
use mail_sift::config::settings::SiftConfig;
use mail_sift::core::analyzer::Analyst;
use mail_sift::domain::ports::{EmailStore, TriageSettings};
use mail_sift::utils::{logger, validation::Validate};
use mail_sift::{ImapMailbox, OpenAiClient, SqliteEmailStore, TriageEngine, TriagePipeline};

#[derive(Parser)]
#[command(name = "mail-sift")]
#[command(about = "Recruiter email triage with an LLM judge")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "mail-sift.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable system resource monitoring
    #[arg(long)]
    monitor: Option<bool>,

    /// Override first-message-only mode from config
    #[arg(long)]
    first_only: Option<bool>,

    /// Override the unread fetch limit from config
    #[arg(long)]
    limit: Option<usize>,

    /// Skip filing decline drafts in the mailbox
    #[arg(long)]
    no_drafts: bool,

    /// Override the archive database path from config
    #[arg(long)]
    db_path: Option<String>,

    /// Dry run - show what would be processed without connecting anywhere
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting mail-sift");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match SiftConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if let Some(first_only) = args.first_only {
        config
            .triage
            .get_or_insert_with(Default::default)
            .first_message_only = Some(first_only);
        tracing::info!("🔧 First-message mode overridden to: {}", first_only);
    }

    if let Some(limit) = args.limit {
        config.triage.get_or_insert_with(Default::default).fetch_limit = Some(limit);
        tracing::info!("🔧 Fetch limit overridden to: {}", limit);
    }

    if args.no_drafts {
        config
            .triage
            .get_or_insert_with(Default::default)
            .draft_replies = Some(false);
        tracing::info!("🔧 Decline drafts disabled for this run");
    }

    if let Some(db_path) = args.db_path.clone() {
        config.storage.get_or_insert_with(Default::default).db_path = Some(db_path);
        tracing::info!("🔧 Archive database overridden to: {}", config.db_path());
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config);
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or(false);

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 建立轉接器
    let mailbox = ImapMailbox::new(
        &config.mailbox.server,
        config.port(),
        &config.mailbox.email,
        &config.mailbox.password,
    );
    let client = OpenAiClient::new(&config.llm.api_key, config.api_base());
    let store = SqliteEmailStore::new(config.db_path());

    // 準備歸檔資料庫
    if let Err(e) = store.init_schema() {
        tracing::error!(
            "❌ Failed to prepare the archive database: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());
        std::process::exit(3);
    }

    // 建立分流管道與引擎並執行
    let analyst = Analyst::new(client, config.profile(), config.models());
    let pipeline = TriagePipeline::new(mailbox, analyst, store, config);
    let engine = TriageEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("✅ Triage run completed successfully!");
            tracing::info!("📊 {}", summary);
            println!("✅ Triage run completed successfully!");
            println!("📊 {}", summary);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Triage run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                mail_sift::utils::error::ErrorSeverity::Low => 0, // 警告，但成功
                mail_sift::utils::error::ErrorSeverity::Medium => 2, // 重試錯誤
                mail_sift::utils::error::ErrorSeverity::High => 1, // 處理錯誤
                mail_sift::utils::error::ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &SiftConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Mailbox: {} ({}:{})",
        config.mailbox.email,
        config.mailbox.server,
        config.port()
    );
    println!("  API base: {}", config.api_base());
    println!(
        "  Models: {} (judge) / {} (drafts)",
        config.analyze_model(),
        config.respond_model()
    );
    println!("  Archive: {}", config.db_path());
    println!("  Fetch limit: {}", config.fetch_limit());
    println!("  First message only: {}", config.first_message_only());
    println!("  Decline drafts: {}", config.draft_replies());
    println!("  Topics: {}", config.interests.topics.join(", "));

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &SiftConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    // 信箱分析
    println!("📡 Mailbox:");
    println!("  Server: {}:{}", config.mailbox.server, config.port());
    println!("  Account: {}", config.mailbox.email);

    // 處理模式分析
    println!();
    println!("⚙️ Processing Mode:");
    if config.first_message_only() {
        println!("  🎯 First-message mode: will look at ONLY the first unread message");
    } else {
        println!(
            "  📊 Normal mode: will process up to {} unread message(s)",
            config.fetch_limit()
        );
    }
    if config.draft_replies() {
        println!("  ✉️ Decline drafts will be filed to the drafts mailbox");
    } else {
        println!("  ⏭️ Decline drafts are disabled");
    }

    // 分析設定
    println!();
    println!("📊 Analysis:");
    println!("  Judge model: {}", config.analyze_model());
    println!("  Drafting model: {}", config.respond_model());
    println!("  Topics: {}", config.interests.topics.join(", "));

    // 歸檔分析
    println!();
    println!("💾 Archive:");
    println!("  Database: {}", config.db_path());

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during an actual run.");
}

use clap::Parser;
use coord_buffer::config::toml_config::TomlConfig;
use coord_buffer::core::AreaStore;
use coord_buffer::utils::error::CoordBufferError;
use coord_buffer::utils::{logger, validation::Validate};
use coord_buffer::{
    is_airac_current, BufferPipeline, CliConfig, CoordinateSource, IngestEngine, JsonAreaStore,
    LocalStorage, Settings, TmaIngestPipeline, WfsFetcher,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let store = JsonAreaStore::new(&settings.store_path);

    if let Some(date) = &cli.check_airac {
        std::process::exit(check_airac(&store, date));
    }

    let outcome = if cli.list {
        list_areas(&store)
    } else if let Some(msid) = cli.msid {
        tracing::info!("Processing msid: {}", msid);
        store
            .area_coordinates(msid)
            .and_then(|coords| buffer_and_print(&settings, &CoordinateSource::LonLat(coords), cli.buffer))
    } else if let Some(input) = &cli.input {
        buffer_file(&cli, &settings, input).await
    } else {
        tracing::info!("No input file provided, fetching TMAs");
        ingest(&cli, &settings, store).await
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());

        // 根據錯誤嚴重程度決定退出碼
        std::process::exit(e.severity().exit_code());
    }

    Ok(())
}

fn load_settings(cli: &CliConfig) -> coord_buffer::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let file = TomlConfig::from_file(path)?;
            file.validate()?;
            Settings::from_toml(&file)
        }
        None => Settings::default(),
    };
    cli.apply_to(&mut settings);
    settings.validate()?;
    Ok(settings)
}

fn check_airac(store: &JsonAreaStore, date: &str) -> i32 {
    match is_airac_current(store, date) {
        Ok(true) => {
            tracing::info!("AIRAC date {} is current or newer than the latest in the store", date);
            0
        }
        Ok(false) => {
            tracing::warn!("AIRAC date {} is older than the latest in the store", date);
            1
        }
        Err(e) => {
            tracing::error!("Error checking AIRAC date: {}", e);
            1
        }
    }
}

fn list_areas(store: &JsonAreaStore) -> coord_buffer::Result<()> {
    let areas = store.list_areas("TMAW")?;
    println!("{:<8} TMA", "MSID");
    for (msid, name) in areas {
        println!("{:<8} {}", msid, name);
    }
    Ok(())
}

async fn buffer_file(cli: &CliConfig, settings: &Settings, input: &str) -> coord_buffer::Result<()> {
    if !std::path::Path::new(input).is_file() {
        return Err(CoordBufferError::ValidationError {
            message: format!("Input file does not exist: {}", input),
        });
    }
    tracing::info!("Processing input file: {}", input);
    // 路徑相對於目前目錄，絕對路徑原樣使用
    let source = CoordinateSource::load(&LocalStorage::new("."), cli.format, input).await?;
    buffer_and_print(settings, &source, cli.buffer)
}

fn buffer_and_print(
    settings: &Settings,
    source: &CoordinateSource,
    buffer_nm: f64,
) -> coord_buffer::Result<()> {
    let lines = BufferPipeline::new(settings.pipeline.clone()).run(source, buffer_nm)?;
    // 全部成功才輸出
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

async fn ingest(cli: &CliConfig, settings: &Settings, store: JsonAreaStore) -> coord_buffer::Result<()> {
    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(&settings.output_folder);
    let fetcher = WfsFetcher::from_config(settings);
    let pipeline = TmaIngestPipeline::new(storage, fetcher, store, settings)?;

    let output_path = IngestEngine::new_with_monitoring(pipeline, cli.monitor)
        .run()
        .await?;
    tracing::info!("✅ TMAs saved to {} and persisted to {}", output_path, settings.store_path);
    Ok(())
}

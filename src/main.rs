use anyhow::Context;
use clap::Parser;
use edu_enroll::config::{BackendKind, TomlConfig};
use edu_enroll::domain::ports::{AuthService, CourseRepository};
use edu_enroll::utils::logger;
use edu_enroll::{app, CliConfig, EnrollEngine, InMemoryBackend, SupabaseClient};
use tokio::io::BufReader;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "❌ Failed to load config file '{}': {} (Category: {:?})",
                cli.config.display(),
                e,
                e.category()
            );
            eprintln!("💡 {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if cli.json_logs(Some(&config)) {
        logger::init_json_logger(cli.verbose, config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }
    tracing::info!("📁 Loaded configuration from {}", cli.config.display());
    tracing::debug!("Backend: {:?}", config.backend.kind);

    match config.backend.kind {
        BackendKind::Supabase => {
            let client = SupabaseClient::new(&config).context("creating the HTTP client")?;
            run(EnrollEngine::new(client.clone(), client)).await
        }
        BackendKind::Memory => {
            let backend = memory_backend(&config).await;
            run(EnrollEngine::new(backend.clone(), backend)).await
        }
    }
}

async fn memory_backend(config: &TomlConfig) -> InMemoryBackend {
    let seed = config.memory_seed();
    tracing::info!("🧪 In-memory backend with {} courses", seed.courses.len());
    let backend = InMemoryBackend::with_courses(seed.courses);
    for account in &seed.accounts {
        backend.add_account(&account.email, &account.password).await;
    }
    backend
}

async fn run<A: AuthService, R: CourseRepository>(mut engine: EnrollEngine<A, R>) -> anyhow::Result<()> {
    engine.start().await;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let result = app::run_shell(&mut engine, stdin, &mut stdout).await;

    engine.shutdown();
    result.context("interactive shell failed")?;
    Ok(())
}

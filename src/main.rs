use clap::Parser;
use dailyquiz::{
    db::Db,
    email::ResendEmailSender,
    generator::{OpenAiGenerator, DEFAULT_API_URL},
    router,
    services::auth::normalize_email,
    AppState,
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// SQLite database URL.
    #[arg(long, env, default_value = "sqlite://dailyquiz.db")]
    database_url: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    /// Email granted admin rights at startup.
    #[arg(long, env)]
    admin_email: Option<String>,

    /// Resend API key. Without it one-time codes are only logged.
    #[arg(long, env, default_value = "")]
    resend_api_key: String,

    /// Mark session cookies as Secure.
    #[arg(long, env, default_value_t = false)]
    secure_cookies: bool,

    /// OpenAI-compatible chat completions endpoint.
    #[arg(long, env, default_value = DEFAULT_API_URL)]
    llm_api_url: String,

    #[arg(long, env)]
    llm_api_key: Option<String>,

    #[arg(long, env, default_value = "gpt-4o-mini")]
    llm_model: String,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tower_http=info,dailyquiz=debug".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    let db = Db::new(args.database_url).await?;

    if let Some(admin_email) = args.admin_email.as_deref().map(normalize_email) {
        if !admin_email.is_empty() {
            db.grant_admin(&admin_email).await?;
        }
    }

    let email = ResendEmailSender::new(args.resend_api_key);
    let generator = OpenAiGenerator::new(args.llm_api_url, args.llm_api_key, args.llm_model);
    if !generator.is_configured() {
        tracing::warn!("LLM_API_KEY is not set, generated quizzes will use placeholder questions");
    }

    let app = router(AppState::new(db, email, generator, args.secure_cookies));

    let listener = tokio::net::TcpListener::bind(&args.address).await?;
    tracing::info!("listening on {}", args.address);
    axum::serve(listener, app).await?;

    Ok(())
}

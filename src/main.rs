use protopool::config::PoolConfig;
use protopool::dispatch::Dispatcher;
use protopool::pool::WorkerPool;
use protopool::tasks::{EmailTask, ImageProcessingTask};

/// Clones of each prototype submitted by the demo.
const CLONES_PER_PROTOTYPE: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = PoolConfig::from_env()?;

    eprintln!("protopool v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Pool: {}", config.name);
    eprintln!("   Workers: {}\n", config.worker_count);

    let pool = WorkerPool::new(config)?;

    // ── Prototypes ───────────────────────────────────────────────────────
    // Each pays its expensive setup exactly once.
    let image_prototype = ImageProcessingTask::load("image1.jpg").await;
    let email_prototype = EmailTask::load("user@example.com", "Hello", "Welcome!").await;

    // ── Dispatch ─────────────────────────────────────────────────────────
    // Interleaved: image1, email1, image2, email2, ...
    let mut dispatcher = Dispatcher::new(&pool);
    for i in 1..=CLONES_PER_PROTOTYPE {
        let mut image = image_prototype.clone();
        image.image_path = format!("image{i}.jpg");
        dispatcher.submit(Box::new(image))?;

        let mut email = email_prototype.clone();
        email.recipient = format!("user{i}@example.com");
        dispatcher.submit(Box::new(email))?;
    }

    let report = dispatcher.finish().await;
    eprintln!(
        "\nAll tasks completed: {} submitted in {:.2}s",
        report.submitted.len(),
        report.elapsed.as_secs_f64()
    );

    let stats = pool.shutdown().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

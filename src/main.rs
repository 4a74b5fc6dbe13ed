use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use workshop_ledger::{
    config::{database, settings},
    core::{
        ordering::CLASSES,
        report::{format_currency, format_purchase_summary, generate_dashboard},
    },
    errors::Result,
};

const SETTINGS_PATH: &str = "config.toml";
const RECENT_PURCHASES: u64 = 5;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Settings file is optional
    let settings = settings::load_settings_or_default(SETTINGS_PATH)
        .inspect_err(|e| error!("Failed to load {SETTINGS_PATH}: {e}"))?;

    // 4. Connect and migrate
    let database_url = database::get_database_url(settings.database.url.as_deref());
    let db = database::create_connection(&database_url)
        .await
        .inspect(|_| info!("Database ready"))
        .inspect_err(|e| error!("Failed to open database: {e}"))?;

    // 5. Seed the material catalogue on first run
    let seeded = settings::seed_catalogue(&db, &settings).await?;
    if seeded > 0 {
        info!(seeded, "Seeded material catalogue");
    }

    // 6. Print the dashboard
    let dashboard = generate_dashboard(&db, RECENT_PURCHASES).await?;
    println!("Students:        {}", dashboard.student_count);
    println!("Active materials: {}", dashboard.material_count);
    println!(
        "Outstanding debt: {} ({} students)",
        format_currency(dashboard.total_debt),
        dashboard.students_in_debt
    );
    println!("Total credit:    {}", format_currency(dashboard.total_credit));

    let classes = CLASSES.get_ordered_labels(&db).await?;
    if !classes.is_empty() {
        println!("Classes:         {}", classes.join(", "));
    }

    if !dashboard.recent_purchases.is_empty() {
        println!("\nRecent purchases:");
        for purchase in &dashboard.recent_purchases {
            println!("  {}", format_purchase_summary(purchase));
        }
    }

    Ok(())
}

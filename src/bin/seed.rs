use dv_checkout_api::{config::AppConfig, directory::DoctorDirectory};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let path = &config.directory_path;

    if tokio::fs::try_exists(path).await? {
        let raw = tokio::fs::read_to_string(path).await?;
        let directory = DoctorDirectory::from_json(&raw)?;
        println!(
            "Directory {} already present ({} codes), leaving it untouched",
            path.display(),
            directory.len()
        );
        return Ok(());
    }

    let sample = json!({
        "DV001": {
            "name": "Dr. Martin",
            "products": [
                { "name": "Hyaluronic gel 20ml", "price": 10.00 },
                { "name": "Repair serum 30ml", "price": 25.50 }
            ]
        },
        "DV002": {
            "name": "Dr. Bernard",
            "products": [
                { "name": "Healing cream 50ml", "price": 18.90 }
            ]
        },
        "DV003": "Dr. Laurent"
    });

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::create_dir_all(&config.data_dir).await?;
    tokio::fs::create_dir_all(&config.upload_dir).await?;
    tokio::fs::write(path, serde_json::to_vec_pretty(&sample)?).await?;

    println!("Seed completed. Sample directory written to {}", path.display());
    Ok(())
}

use color_eyre::Result;
use clap::Parser;
use std::path::Path;
use deepwork::{Config, Database, Profile, Storage, SystemClock, cli::Cli};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    env_logger::Builder::from_env(env_logger::Env::new().filter_or("DEEPWORK_LOG", "warn")).init();

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from_path(Path::new(path))?,
        None => Config::load_with_profile(profile)?,
    };

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path.to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?
    )?;
    log::debug!("using database {:?}", db_path);

    let storage = Storage::new(db);
    deepwork::cli::run(cli.command, &storage, &SystemClock, &config)?;

    Ok(())
}

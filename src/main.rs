mod cli;

use clap::Parser;
use cli::{Cli, Commands, ExploreArgs, InspectArgs};
use std::collections::BTreeMap;
use std::sync::Arc;

use finfo::config::Config;
use finfo::dispatch::{Dispatcher, Selection};
use finfo::extractors::Registry;
use finfo::observability;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    observability::init(&config.logging.filter);

    let registry = Arc::new(Registry::from_config(&config.extractors)?);

    match cli.command {
        Commands::Inspect(args) => inspect(registry, config, args)?,
        Commands::Properties => {
            let details = registry.virtual_property_details();
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Commands::Describe(args) => match registry.describe_handler(&args.handler) {
            Some(descriptor) => println!("{}", serde_json::to_string_pretty(descriptor)?),
            None => return Err(format!("extractor not registered: {}", args.handler).into()),
        },
        Commands::Explore(args) => explore(registry, args)?,
    }

    Ok(())
}

fn inspect(registry: Arc<Registry>, config: Config, args: InspectArgs) -> Result<(), BoxError> {
    let mut settings = config.dispatch;
    settings.return_everything |= args.all;

    let dispatcher = Dispatcher::builder()
        .registry(registry)
        .settings(settings)
        .build();

    let mut properties = args.properties;
    let selection = match properties.len() {
        0 => Selection::Unspecified,
        1 => Selection::Single(properties.remove(0)),
        _ => Selection::Set(properties),
    };

    let values = dispatcher.get_all(&args.file, selection)?;
    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

fn explore(registry: Arc<Registry>, args: ExploreArgs) -> Result<(), BoxError> {
    let dispatcher = Dispatcher::new(registry);
    let explorer = dispatcher.explore(&args.handler, &args.file)?;
    let layer = args.layer.into();

    let values = if args.keys.is_empty() {
        explorer.extract_all(layer)
    } else {
        args.keys
            .into_iter()
            .filter_map(|key| {
                let value = explorer.value(layer, &key).into_value()?;
                Some((key, value))
            })
            .collect::<BTreeMap<_, _>>()
    };

    println!("{}", serde_json::to_string_pretty(&values)?);
    Ok(())
}

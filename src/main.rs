//! Demo front end: loads an application resource directory (plus optional
//! framework and library directories), then resolves one resource.
//!
//! ```text
//! restable [--config FILE] [--framework DIR] [--library PACKAGE=DIR]...
//!          [--quantity N] PACKAGE RES_DIR TYPE/NAME [QUALIFIERS]
//! ```

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use restable::cache::ResourceCache;
use restable::config::Settings;
use restable::construct::{ResName, APPLICATION_PACKAGE_IDENTIFIER, FRAMEWORK_PACKAGE_IDENTIFIER};
use restable::error::{ResourceError, Result};
use restable::loader::{DirectoryLoader, ResourceLoader};
use restable::overlay::OverlayResourceTable;
use restable::resolver::ResourceResolver;
use restable::routing::RoutingResourceTable;
use restable::table::{PackageResourceTable, ResourceTable};

/// Load resource directories and resolve one resource
#[derive(Parser, Debug)]
#[command(name = "restable")]
#[command(version, about, long_about = None)]
struct Arguments {
    /// Settings file, layered under `RESTABLE_*` environment variables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Framework resource directory
    #[arg(long)]
    framework: Option<PathBuf>,

    /// Library resource directory, merged into the application overlay
    #[arg(long = "library", value_name = "PACKAGE=DIR", value_parser = parse_library)]
    libraries: Vec<(String, PathBuf)>,

    /// Resolve the query as a plural for this quantity
    #[arg(long)]
    quantity: Option<i32>,

    /// Application package name
    package: String,

    /// Application resource directory
    res_dir: PathBuf,

    /// Resource to resolve, as TYPE/NAME or @PACKAGE:TYPE/NAME
    query: String,

    /// Device qualifiers, overriding the configured ones
    qualifiers: Option<String>,
}

fn parse_library(arg: &str) -> std::result::Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((package, dir)) if !package.is_empty() && !dir.is_empty() => {
            Ok((package.to_string(), PathBuf::from(dir)))
        }
        _ => Err(format!("expected PACKAGE=DIR, got '{}'", arg)),
    }
}

fn main() -> ExitCode {
    let arguments = match Arguments::try_parse() {
        Ok(arguments) => arguments,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures
            return if e.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };
    let settings = match Settings::load(arguments.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match run(&arguments, &settings) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!(error = %e, "resolution failed");
            ExitCode::FAILURE
        }
    }
}

fn run(arguments: &Arguments, settings: &Settings) -> Result<bool> {
    let mut loaders: Vec<Box<dyn ResourceLoader>> = vec![Box::new(
        DirectoryLoader::on_disk(arguments.package.as_str(), arguments.res_dir.as_path())
            .with_generated_ids(APPLICATION_PACKAGE_IDENTIFIER),
    )];
    for (package, dir) in &arguments.libraries {
        loaders.push(Box::new(DirectoryLoader::on_disk(package.as_str(), dir.as_path())));
    }
    let overlay = OverlayResourceTable::build(&arguments.package, loaders, &settings.overlay)?;
    if let Some(cache_path) = &settings.cache_path {
        ResourceCache::save_to_path(overlay.table(), cache_path)?;
    }

    let mut routing = RoutingResourceTable::new();
    if let Some(framework_dir) = &arguments.framework {
        let loader = DirectoryLoader::on_disk(settings.framework_package.as_str(), framework_dir.as_path())
            .with_generated_ids(FRAMEWORK_PACKAGE_IDENTIFIER);
        let mut framework = PackageResourceTable::new(settings.framework_package.as_str());
        loader.load(&mut framework)?;
        framework.seal();
        routing.register(Arc::new(framework));
    }
    routing.register(Arc::new(overlay));
    let resolver = ResourceResolver::new(Arc::new(routing));

    let qualifiers = arguments.qualifiers.as_deref().unwrap_or(&settings.qualifiers);
    let res_name = ResName::qualify(&arguments.query, &arguments.package, "string")
        .ok_or_else(|| ResourceError::Config(format!("cannot read resource name '{}'", arguments.query)))?;
    info!(name = %res_name, qualifiers, "resolving");

    if let Some(quantity) = arguments.quantity {
        return Ok(match resolver.resolve_plural(&res_name, quantity, qualifiers) {
            Some(text) => {
                println!("{}", text);
                true
            }
            None => false,
        });
    }
    if let Some(value) = resolver.resolve_value(&res_name, qualifiers) {
        let id = resolver.table().get_resource_id(&res_name);
        match id {
            Some(id) => println!("{} ({:#010x}) = {}", res_name, id, value),
            None => println!("{} = {}", res_name, value),
        }
        return Ok(true);
    }
    if let Some(block) = resolver.resolve_xml(&res_name, qualifiers) {
        println!("{} -> {}", res_name, block.file());
        return Ok(true);
    }
    if let Some(mut stream) = resolver.resolve_raw(&res_name, qualifiers) {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        println!("{}: {} bytes", res_name, bytes.len());
        return Ok(true);
    }
    println!("{}: no value for '{}'", res_name, qualifiers);
    Ok(false)
}

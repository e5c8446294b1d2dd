#![cfg(feature = "cli")]

use std::{process::ExitCode, sync::Arc};

use camino::{Utf8Path, Utf8PathBuf};
use clap::arg;
use tracing_subscriber::EnvFilter;
use zonegen::{
    PluginRegistry, SerialNumberManager, ZoneConfig, ZoneGenerator, render::write_zone_file,
    rr::Zones,
};

fn main() -> ExitCode {
    match generate() {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn generate() -> Result<(), ()> {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let app = clap::Command::new("zonegen")
        .about("Generate DNS zone files from a zone definition")
        .args([
            arg!(--definition <PATH> "Zone definition file (JSON)")
                .required(true)
                .value_parser(clap::value_parser!(Utf8PathBuf)),
            arg!(--output <DIR> "Directory to write zone files to")
                .required(true)
                .value_parser(clap::value_parser!(Utf8PathBuf)),
            arg!(--plugins <DIR> "Directory containing plugin executables")
                .value_parser(clap::value_parser!(Utf8PathBuf))
                .default_value("plugins"),
            arg!(--serials <DIR> "Directory holding serial change indexes")
                .value_parser(clap::value_parser!(Utf8PathBuf))
                .default_value("serials"),
            arg!(--"generate-serial" "Generate SOA serial numbers for zones without a config"),
            arg!(--reverse "Derive reverse lookup zones for zones without a config"),
        ]);

    let args = app.get_matches();
    let definition: &Utf8PathBuf = args.get_one("definition").expect("definition is required");
    let output: &Utf8PathBuf = args.get_one("output").expect("output is required");
    let plugins: &Utf8PathBuf = args.get_one("plugins").expect("plugins has a default");
    let serials: &Utf8PathBuf = args.get_one("serials").expect("serials has a default");

    let defaults = ZoneConfig::default()
        .with_generate_serial(args.get_flag("generate-serial"))
        .with_reverse_lookup_zones(args.get_flag("reverse"))
        .with_serial_directory(serials.clone())
        .with_plugins_directory(plugins.clone());

    let zones = match load_definition(definition) {
        Ok(zones) => zones,
        Err(error) => {
            eprintln!("Error loading zone definition from {definition}:");
            eprintln!("{error}");
            return Err(());
        }
    };

    let mut builder = PluginRegistry::builder();
    builder.with_builtins(Arc::new(SerialNumberManager::new()));
    if let Err(error) = builder.load_external(plugins) {
        eprintln!("Error loading plugins from {plugins}:");
        eprintln!("{error}");
        return Err(());
    }
    let registry = builder.build();

    let generated = ZoneGenerator::new(&registry)
        .with_defaults(defaults)
        .generate(zones);

    let mut failed = !generated.is_success();
    for error in &generated.errors {
        eprintln!("{error}");
    }

    for (name, text) in &generated.rendered {
        match write_zone_file(output, name, text) {
            Ok(path) => println!("Zone '{name}' written to {path}"),
            Err(error) => {
                eprintln!("{error}");
                failed = true;
            }
        }
    }

    if failed { Err(()) } else { Ok(()) }
}

fn load_definition(path: &Utf8Path) -> Result<Zones, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let zones: Zones = serde_json::from_str(&contents)?;
    if zones.is_empty() {
        return Err("definition contains no zones".into());
    }
    Ok(zones)
}

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::Value;
use std::path::Path;
use tablecraft::error_display::user_message_from_report;
use tablecraft::render::{render_nested, render_table};
use tablecraft::{
    AppConfig, ConfigManager, FieldSchema, TableData, TableEngine, TableProperties, APP_NAME,
};
use tablecraft_cli::{Args, OutputFormat};

fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a JSON input, turning failures into a one-line message naming the file.
fn load_json(path: &Path) -> Result<Value> {
    read_json(path).map_err(|e| eyre!(user_message_from_report(&e, Some(path))))
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Configuration written to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error writing config: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(None)
}

fn build_engine(args: &Args, config: &AppConfig) -> Result<TableEngine> {
    let mut engine = TableEngine::with_config(config);
    if args.debug {
        engine.enable_debug();
    }

    if let Some(path) = &args.properties {
        engine.set_properties(TableProperties::from_json(load_json(path)?));
    }
    if let Some(path) = &args.schema {
        let schema: Vec<FieldSchema> = serde_json::from_value(load_json(path)?)
            .map_err(|e| eyre!("Invalid schema in {}: {}", path.display(), e))?;
        engine.set_schema(schema);
    }
    if let Some(path) = &args.data {
        let data = TableData::from_json(load_json(path)?)
            .map_err(|e| eyre!("Invalid data in {}: {}", path.display(), e))?;
        engine.set_data(data);
    }

    let multi = args.multi_sort || config.sorting.multi_select;
    for (idx, key) in args.sort.iter().enumerate() {
        if !engine.on_header_click(key, multi && idx > 0) {
            log::info!("Header click on '{}' left the table unchanged", key);
        }
    }
    if let Some((key, value)) = args.drill_down_pair() {
        engine.drill_down(&key, &Value::String(value));
    }
    Ok(engine)
}

fn run(args: &Args) -> Result<()> {
    let config = AppConfig::load(APP_NAME)?;
    let engine = build_engine(args, &config)?;
    let output = args.output.unwrap_or_default();
    let max_width = config.display.max_cell_width;

    match (output, &args.expand) {
        (OutputFormat::Json, None) => {
            println!("{}", serde_json::to_string_pretty(engine.view())?);
        }
        (OutputFormat::Text, None) => {
            print!("{}", render_table(&engine, args.page.unwrap_or(1), max_width));
        }
        (format, Some(row_key)) => {
            let nested = engine
                .expand_row(row_key)
                .ok_or_else(|| eyre!("Row '{}' has no nested table", row_key))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&nested)?),
                OutputFormat::Text => {
                    print!("{}", render_nested(&engine, &nested, max_width));
                    if let Some(level_two) = engine.expand_level_two() {
                        println!();
                        print!("{}", render_nested(&engine, &level_two, max_width));
                    }
                }
            }
        }
    }

    if engine.debug().enabled {
        eprintln!("{}", engine.debug());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::Path;

use coldash::chart_export::{
    data_extension, export_chart_image, export_dashboard_image, export_dataset, extension,
    write_atomic, DashboardImageOptions,
};
use coldash::dataset::PREVIEW_ROWS;
use coldash::error_display::load_failure_message;
use coldash::render::canvas_id;
use coldash::{logging, AppConfig, Args, ChartKind, ConfigManager, Dashboard, LoadOptions, ThemeMode};

/// Command-line flags win over the config file.
fn apply_cli_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(kind) = args.default_kind {
        config.chart.default_kind = ChartKind::from(kind).as_str().to_string();
    }
    if let Some(theme) = args.theme {
        config.theme.mode = ThemeMode::from(theme).as_str().to_string();
    }
    if let Some(width) = args.width {
        config.chart.width = width;
    }
    if let Some(height) = args.height {
        config.chart.height = height;
    }
    if let Some(format) = args.chart_format {
        config.export.chart_format = extension(format).to_string();
    }
    if let Some(format) = args.data_format {
        config.export.data_format = data_extension(format).to_string();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(file) = &args.log_file {
        config.logging.file = Some(file.clone());
    }
}

/// Parses `COLUMN=KIND`. The column name may itself contain `=`; the last one splits.
fn parse_kind_override(raw: &str) -> Result<(String, ChartKind)> {
    let (column, kind) = raw
        .rsplit_once('=')
        .ok_or_else(|| eyre!("Invalid --kind '{}'. Expected COLUMN=KIND", raw))?;
    let kind = kind.parse::<ChartKind>().map_err(|e| eyre!(e))?;
    Ok((column.to_string(), kind))
}

fn print_preview(dashboard: &Dashboard, limit: usize) {
    let Some(dataset) = dashboard.dataset() else {
        return;
    };
    println!(
        "{} rows, {} columns",
        dataset.row_count(),
        dataset.column_count()
    );
    println!("{}", dataset.headers().join("\t"));
    for row in dataset.preview(limit) {
        println!("{}", row.join("\t"));
    }
    println!();
}

fn print_reports(dashboard: &Dashboard) {
    for report in dashboard.reports() {
        println!(
            "{} [{}, {}]",
            report.column, report.column_kind, report.chart_kind
        );
        if let Some(text) = report.panel_text() {
            println!("  {}", text);
        }
    }
}

fn write_outputs(dashboard: &Dashboard, config: &AppConfig, args: &Args) -> Result<()> {
    if let Some(out_dir) = &args.out_dir {
        std::fs::create_dir_all(out_dir)?;
        let format = config.export.chart_image_format();
        for column in dashboard.selected_columns() {
            if dashboard.registry().get(column).is_none() {
                continue;
            }
            match export_chart_image(dashboard.registry(), column, format) {
                Ok(bytes) => {
                    let path =
                        out_dir.join(format!("{}.{}", canvas_id(column), extension(format)));
                    write_atomic(&path, &bytes)?;
                    println!("Wrote {}", path.display());
                }
                Err(e) => eprintln!("{}: {}", column, e),
            }
        }
    }

    if let Some(path) = &args.dashboard_image {
        let options = DashboardImageOptions {
            exclude_controls: !args.include_controls,
            scale: config.export.dashboard_scale,
        };
        let bytes = export_dashboard_image(dashboard, options)?;
        write_atomic(path, &bytes)?;
        println!("Wrote {}", path.display());
    }

    if let Some(path) = &args.export_data {
        let dataset = dashboard
            .dataset()
            .ok_or_else(|| eyre!("No dataset loaded"))?;
        let bytes = export_dataset(dataset, config.export.data_export_format())?;
        write_atomic(path, &bytes)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn run(args: &Args, path: &Path) -> Result<()> {
    let config_manager = ConfigManager::new(coldash::APP_NAME)?;
    let mut config = AppConfig::load_with(&config_manager)?;
    apply_cli_overrides(&mut config, args);
    config.validate()?;

    logging::init_with(
        config.logging.file.clone(),
        logging::parse_level(&config.logging.level)?,
    )?;

    let dataset = match coldash::load_path(path, &LoadOptions::from_args(args)) {
        Ok(dataset) => dataset,
        Err(e) => return Err(eyre!(load_failure_message(path, &e))),
    };

    let mut dashboard = Dashboard::with_plotters(&config)?;
    dashboard.load(dataset);
    print_preview(&dashboard, args.preview_rows.unwrap_or(PREVIEW_ROWS));

    if args.columns.is_empty() {
        dashboard.build()?;
    } else {
        dashboard.select_columns(&args.columns)?;
    }
    for raw in &args.kinds {
        let (column, kind) = parse_kind_override(raw)?;
        dashboard.set_chart_kind(&column, kind)?;
    }
    if let Some(column) = &args.fullscreen {
        dashboard.toggle_fullscreen(column)?;
    }

    print_reports(&dashboard);
    write_outputs(&dashboard, &config, args)?;
    dashboard.teardown();
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if args.generate_config {
        let config_manager = ConfigManager::new(coldash::APP_NAME)?;
        match config_manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Wrote default configuration to {}", path.display());
                return Ok(());
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    let Some(path) = args.path.clone() else {
        return Err(eyre!("A data file path is required"));
    };
    if let Err(e) = run(&args, &path) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_override_splits_on_last_equals() {
        let (column, kind) = parse_kind_override("a=b=pie").unwrap();
        assert_eq!(column, "a=b");
        assert_eq!(kind, ChartKind::Pie);
        assert!(parse_kind_override("age").is_err());
        assert!(parse_kind_override("age=radar").is_err());
    }

    #[test]
    fn cli_flags_override_config() {
        let args = Args::parse_from([
            "coldash",
            "data.csv",
            "--theme",
            "dark",
            "--width",
            "640",
            "--chart-format",
            "eps",
        ]);
        let mut config = AppConfig::default();
        apply_cli_overrides(&mut config, &args);
        assert_eq!(config.theme.mode, "dark");
        assert_eq!(config.chart.width, 640);
        assert_eq!(config.chart.height, 800);
        assert_eq!(config.export.chart_format, "eps");
        assert!(config.validate().is_ok());
    }
}

/// meshview - interactive terminal viewer for OBJ models
///
/// Usage: meshview [--config <file>] [model.obj ...]
///
/// Models given on the command line replace the configured object list.
use anyhow::{bail, Context, Result};
use crossterm::terminal;
use meshview_core::{load_obj, MeshObject, ViewerState};
use meshview_terminal::config::ViewerConfig;
use meshview_terminal::logging::Logging;
use meshview_terminal::{SoftwareDevice, TerminalApp};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const USAGE: &str = "Usage: meshview [--config <file>] [model.obj ...]";

struct Args {
    config: Option<PathBuf>,
    models: Vec<PathBuf>,
}

enum Parsed {
    Run(Args),
    Help,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Parsed> {
    let mut config = None;
    let mut models = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Parsed::Help),
            "-c" | "--config" => {
                let path = args.next().context("--config needs a file argument")?;
                config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with('-') => bail!("unknown option '{}'\n{}", flag, USAGE),
            model => models.push(PathBuf::from(model)),
        }
    }

    Ok(Parsed::Run(Args { config, models }))
}

/// Objects are named by their source path.
fn object_name(path: &Path) -> String {
    path.display().to_string()
}

fn main() -> Result<()> {
    let args = match parse_args(env::args().skip(1))? {
        Parsed::Run(args) => args,
        Parsed::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    let mut config = ViewerConfig::load(args.config.as_deref())?;
    if !args.models.is_empty() {
        config.set_objects_from_paths(args.models);
    }

    let logging = Logging::init(config.log_file.as_deref())?;
    info!("Starting meshview");

    let (width, height) = terminal::size().context("failed to query terminal size")?;
    let mut device = SoftwareDevice::new(width as usize, height as usize)?;

    let mut objects = Vec::new();
    for entry in &config.objects {
        let mesh = match load_obj(&entry.path) {
            Ok(mesh) => mesh,
            Err(err) => {
                error!("Skipping {}: {}", entry.path.display(), err);
                continue;
            }
        };
        let object = MeshObject::new(&mut device, object_name(&entry.path), &mesh)?
            .with_position(entry.position());
        objects.push(object);
    }

    if objects.is_empty() {
        bail!("No objects loaded. Exiting.");
    }
    info!("Loaded {} objects", objects.len());

    let state = ViewerState::new(objects, config.speeds);
    let app = TerminalApp::new(state, device, config);

    logging.quiet()?;
    let result = app.run();
    logging.restore()?;
    result?;

    info!("Goodbye");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Parsed> {
        parse_args(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn test_models_and_config() {
        let Parsed::Run(args) = parse(&["--config", "view.toml", "a.obj", "b.obj"]).unwrap() else {
            panic!("expected run");
        };
        assert_eq!(args.config, Some(PathBuf::from("view.toml")));
        assert_eq!(args.models, vec![PathBuf::from("a.obj"), PathBuf::from("b.obj")]);
    }

    #[test]
    fn test_same_file_name_in_different_directories() {
        let a = object_name(Path::new("a/model.obj"));
        let b = object_name(Path::new("b/model.obj"));
        assert_ne!(a, b);
        assert_eq!(a, Path::new("a/model.obj").display().to_string());
    }

    #[test]
    fn test_help_and_bad_flags() {
        assert!(matches!(parse(&["-h"]).unwrap(), Parsed::Help));
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--config"]).is_err());
    }
}

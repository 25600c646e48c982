/// Tracing setup
///
/// Filtering follows `RUST_LOG` (default `info`). Output goes to the
/// configured log file, or to stderr. Stderr shares the screen with the
/// viewer, so it is muted while the viewer owns the terminal.
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

pub struct Logging {
    filter: reload::Handle<EnvFilter, Registry>,
    directives: String,
    to_file: bool,
}

impl Logging {
    pub fn init(log_file: Option<&Path>) -> anyhow::Result<Self> {
        let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
        let directives = filter.to_string();
        let (filter_layer, filter) = reload::Layer::new(filter);

        let file_layer = match log_file {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
            }
            None => None,
        };
        let stderr_layer = log_file
            .is_none()
            .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(file_layer)
            .with(stderr_layer)
            .try_init()?;

        Ok(Self {
            filter,
            directives,
            to_file: log_file.is_some(),
        })
    }

    /// Silence stderr output while the terminal is in the alternate screen.
    pub fn quiet(&self) -> Result<(), reload::Error> {
        if self.to_file {
            return Ok(());
        }
        self.filter.modify(|filter| *filter = EnvFilter::new("off"))
    }

    /// Undo [`Logging::quiet`].
    pub fn restore(&self) -> Result<(), reload::Error> {
        if self.to_file {
            return Ok(());
        }
        let directives = self.directives.clone();
        self.filter
            .modify(|filter| *filter = EnvFilter::new(directives))
    }
}

use console::style;
use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use std::io::Write;

/// How much of the library's log output reaches stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        match (verbose, quiet) {
            (true, _) => Verbosity::Verbose,
            (false, true) => Verbosity::Quiet,
            (false, false) => Verbosity::Normal,
        }
    }

    fn filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Error,
            Verbosity::Normal => LevelFilter::Warn,
            Verbosity::Verbose => LevelFilter::Debug,
        }
    }
}

/// Initialize logger; `RUST_LOG` overrides the flag-derived level
pub fn init_logger(verbosity: Verbosity) {
    let default_filter = verbosity.filter().to_string().to_lowercase();
    let env = Env::default().filter_or("RUST_LOG", default_filter);

    Builder::from_env(env)
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => style("ERROR").red().bold(),
                Level::Warn => style("WARN ").yellow().bold(),
                Level::Info => style("INFO ").green(),
                Level::Debug => style("DEBUG").cyan(),
                Level::Trace => style("TRACE").dim(),
            };
            writeln!(buf, "{} {}", level, record.args())
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_wins_over_quiet() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn filters() {
        assert_eq!(Verbosity::Quiet.filter(), LevelFilter::Error);
        assert_eq!(Verbosity::Verbose.filter(), LevelFilter::Debug);
    }
}

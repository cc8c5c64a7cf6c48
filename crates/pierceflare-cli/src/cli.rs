//! Command-line arguments
//!
//! The only accepted argument is `--force-ping`. Anything else is a usage
//! error reported before any configuration is read.

/// Flag forcing a single real update
pub const FORCE_PING: &str = "--force-ping";

/// Parsed command-line arguments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// Run once and send a real update
    pub force_ping: bool,
}

/// Parse arguments, program name excluded
///
/// Returns the first unrecognized argument on failure.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parsed = CliArgs::default();

    for arg in args {
        let arg = arg.into();
        if arg == FORCE_PING {
            parsed.force_ping = true;
        } else {
            return Err(arg);
        }
    }

    Ok(parsed)
}

//! Development server configuration derived from `dev` arguments.

use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::time::Duration;

use sd_builder_config::BuildOptions;

use crate::cli::DevArgs;
use crate::dev::watcher::default_ignores;
use crate::error::{CliError, ConfigError, Result};

/// How many ports above the requested one are tried before giving up.
const PORT_SEARCH_RANGE: u16 = 10;

#[derive(Debug, Clone)]
pub struct DevConfig {
    /// Server socket address (IP + port)
    pub addr: SocketAddr,

    /// Quiet period before a burst of changes fires a reaction
    pub debounce: Duration,

    /// Directories never watched, relative to the project root
    pub watch_ignore: Vec<PathBuf>,
}

impl DevConfig {
    pub fn from_args(args: &DevArgs, options: &BuildOptions) -> Result<Self> {
        if args.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "port".to_string(),
                value: "0".to_string(),
                hint: "Use a port between 1 and 65535".to_string(),
            }
            .into());
        }

        Ok(Self {
            addr: find_available_port(args.port)?,
            debounce: Duration::from_millis(args.debounce_ms),
            watch_ignore: default_ignores(options.build_dir(), options.root_dir()),
        })
    }
}

/// Try `requested` first, then the next few ports on localhost.
pub fn find_available_port(requested: u16) -> Result<SocketAddr> {
    if requested < 1024 {
        crate::ui::warning(&format!(
            "Port {} is in privileged range, may require root access",
            requested
        ));
    }

    for offset in 0..=PORT_SEARCH_RANGE {
        let Some(port) = requested.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        if TcpListener::bind(addr).is_ok() {
            if offset > 0 {
                crate::ui::warning(&format!(
                    "Port {} is busy, using port {} instead",
                    requested, port
                ));
            }
            return Ok(addr);
        }
    }

    Err(CliError::Server(format!(
        "No available port in range {}-{}",
        requested,
        requested.saturating_add(PORT_SEARCH_RANGE)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_port_falls_forward() {
        let held = TcpListener::bind("127.0.0.1:0").unwrap();
        let busy = held.local_addr().unwrap().port();
        if busy == u16::MAX {
            return;
        }

        let addr = find_available_port(busy).unwrap();
        assert_ne!(addr.port(), busy);
        assert!(addr.port() > busy);
    }

    #[test]
    fn test_port_zero_rejected() {
        let options = BuildOptions::resolve(&Default::default(), std::path::Path::new("/project"));
        let args = DevArgs {
            port: 0,
            debounce_ms: 100,
        };
        let err = DevConfig::from_args(&args, &options).unwrap_err();
        assert!(err.to_string().contains("Invalid value for 'port'"));
    }
}

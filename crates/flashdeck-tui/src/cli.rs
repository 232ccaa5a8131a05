//! Command-line flags.

use anyhow::{bail, Result};

pub const USAGE: &str = "\
Usage: flashdeck [--origin <url>] [COMMAND]

Without a command, opens the flashcard viewer.

Commands:
  --install       Install the offline cache and print what was cached
  --list-caches   List cache buckets with entry counts and ages
  --clear-caches  Delete every cache bucket
  --help          Show this message

Options:
  --origin <url>  Deployment to load cards from (or FLASHDECK_ORIGIN)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    View,
    Install,
    ListCaches,
    ClearCaches,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub origin: Option<String>,
    pub command: Command,
}

impl CliArgs {
    /// Parse arguments, excluding the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut origin = None;
        let mut command = Command::View;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let next = match arg.as_str() {
                "--origin" => {
                    match iter.next() {
                        Some(value) => origin = Some(value.clone()),
                        None => bail!("--origin needs a URL"),
                    }
                    continue;
                }
                "--install" => Command::Install,
                "--list-caches" => Command::ListCaches,
                "--clear-caches" => Command::ClearCaches,
                "-h" | "--help" => Command::Help,
                other => bail!("Unknown argument: {}", other),
            };
            if command != Command::View {
                bail!("Only one command may be given");
            }
            command = next;
        }

        Ok(Self { origin, command })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_default() {
        let cli = CliArgs::parse(&[]).unwrap();
        assert_eq!(cli.command, Command::View);
        assert_eq!(cli.origin, None);
    }

    #[test]
    fn test_parse_origin_and_command() {
        let cli = CliArgs::parse(&args(&["--origin", "https://cards.example/", "--install"])).unwrap();
        assert_eq!(cli.command, Command::Install);
        assert_eq!(cli.origin.as_deref(), Some("https://cards.example/"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(CliArgs::parse(&args(&["--origin"])).is_err());
        assert!(CliArgs::parse(&args(&["--bogus"])).is_err());
        assert!(CliArgs::parse(&args(&["--install", "--clear-caches"])).is_err());
    }
}

use std::str::FromStr;
use serde::Deserialize;

/// Where the child's stdout/stderr go.
///
/// Neither mode forwards output to the supervisor's own terminal.
///
/// - `Discard`: both streams are connected to the null device (default).
/// - `Log`: both streams are piped and drained line by line into `debug!`
///   events, so they only show up when running with `--log-level debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildOutput {
    Discard,
    Log,
}

impl Default for ChildOutput {
    fn default() -> Self {
        ChildOutput::Discard
    }
}

impl FromStr for ChildOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discard" => Ok(ChildOutput::Discard),
            "log" => Ok(ChildOutput::Log),
            other => Err(format!(
                "invalid output mode: {other} (expected \"discard\" or \"log\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_output_modes_case_insensitively() {
        assert_eq!("discard".parse::<ChildOutput>(), Ok(ChildOutput::Discard));
        assert_eq!(" LOG ".parse::<ChildOutput>(), Ok(ChildOutput::Log));
        assert!("inherit".parse::<ChildOutput>().is_err());
    }

    #[test]
    fn default_is_discard() {
        assert_eq!(ChildOutput::default(), ChildOutput::Discard);
    }
}

//! Command definitions
//!
//! A request sent to the store: name followed by binary-safe arguments.

/// A single store command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    args: Vec<Vec<u8>>,
}

impl Command {
    /// Start a command with its name (`"GET"`, `"EVALSHA"`, ...)
    pub fn new(name: &str) -> Self {
        Self {
            args: vec![name.as_bytes().to_vec()],
        }
    }

    /// Build from raw parts as decoded off the wire
    pub fn from_parts(args: Vec<Vec<u8>>) -> Self {
        Self { args }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(arg.as_ref().to_vec());
        self
    }

    /// Append every argument of an iterator
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: AsRef<[u8]>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_vec()));
        self
    }

    /// Upper-cased command name, empty for an empty command
    pub fn name(&self) -> String {
        self.args
            .first()
            .map(|n| String::from_utf8_lossy(n).to_ascii_uppercase())
            .unwrap_or_default()
    }

    /// All parts including the name
    pub fn parts(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// Arguments after the name
    pub fn arguments(&self) -> &[Vec<u8>] {
        self.args.get(1..).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

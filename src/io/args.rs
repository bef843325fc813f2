use log::{debug, warn};
use std::collections::BTreeMap;

/// Every group flag starts with this character.
pub const SEPARATOR: char = '-';

/// Raw command-line values grouped under the flag that introduced them.
///
/// Value order inside a group is positional (index 0/1/2 = x/y/z). Group
/// order is irrelevant; a `BTreeMap` keeps dumps stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterTable {
    groups: BTreeMap<String, Vec<String>>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenizes program arguments, without the program name.
    ///
    /// * `-name` with `name` made of ASCII letters, `.` or `_` opens (or
    ///   re-opens) a group and makes it current.
    /// * `-123` is a value of the current group; any other token starting
    ///   with `-` is dropped, including negative decimals like `-0.5`.
    /// * Anything else is a value of the current group.
    /// * Values seen before the first group, and a bare `-`, are dropped.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        let mut current: Option<String> = None;

        for arg in args {
            let token = arg.as_ref();
            if token.is_empty() {
                continue;
            }

            if let Some(rest) = token.strip_prefix(SEPARATOR) {
                if rest.is_empty() {
                    continue;
                }
                if is_group_name(rest) {
                    table.open_group(rest);
                    current = Some(rest.to_string());
                } else if let Some(group) = &current
                    && is_signed_integer(token)
                {
                    table.push_value(group, token);
                } else {
                    warn!(
                        "Ignoring argument '{}': only integers may start with '{}'",
                        token, SEPARATOR
                    );
                }
                continue;
            }

            match &current {
                Some(group) => table.push_value(group, token),
                None => debug!("Ignoring argument '{}' given before any option", token),
            }
        }

        table
    }

    /// Registers `name` with no values unless it already exists.
    pub fn open_group(&mut self, name: &str) {
        self.groups.entry(name.to_string()).or_default();
    }

    pub fn push_value(&mut self, name: &str, value: &str) {
        self.groups
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Inserts a whole group, replacing any previous values.
    pub fn set_group(&mut self, name: &str, values: Vec<String>) {
        self.groups.insert(name.to_string(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Logs every group and its values at debug level.
    pub fn log_dump(&self) {
        if self.is_empty() {
            debug!("No parameter groups given");
        }
        for (name, values) in self.iter() {
            debug!("Cmds[ {} ] = [ {} ]", name, values.join(" "));
        }
    }
}

/// ASCII letters plus '.' and '_'.
fn is_group_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '.' || c == '_')
}

/// Optional leading '-', then at least one ASCII digit and nothing else.
fn is_signed_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

use crate::core::color::Bgra;
use crate::error::{ConfigError, GroupProblem};
use crate::io::args::ParameterTable;
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output file written when `-output` is not given.
pub const DEFAULT_OUTPUT: &str = "framebuffer.tga";

/// A named parameter group and the number of values it takes.
#[derive(Debug, Clone, Copy)]
pub struct GroupRule {
    pub name: &'static str,
    /// `None` accepts any number of values.
    pub arity: Option<usize>,
    pub required: bool,
    pub help: &'static str,
}

const fn required(name: &'static str, arity: usize, help: &'static str) -> GroupRule {
    GroupRule {
        name,
        arity: Some(arity),
        required: true,
        help,
    }
}

const fn optional(name: &'static str, arity: Option<usize>, help: &'static str) -> GroupRule {
    GroupRule {
        name,
        arity,
        required: false,
        help,
    }
}

pub const GROUPS: [GroupRule; 12] = [
    required("obj", 1, "model file to render"),
    required("width", 1, "output image width in pixels"),
    required("height", 1, "output image height in pixels"),
    required("light_dir", 3, "light direction x y z"),
    required("eye", 3, "camera position x y z"),
    required("center", 3, "camera look-at target x y z"),
    required("up", 3, "camera up vector x y z"),
    required("new_bgra", 4, "background blue green red alpha, 0-255"),
    optional("models", None, "additional model files"),
    optional("output", Some(1), "output image path"),
    optional("placeholders", Some(0), "create missing empty texture files next to -obj"),
    optional("config", Some(1), "TOML file supplying groups not given here"),
];

/// The immutable description of one render.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub model_path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Direction towards the light, in object space.
    pub light_dir: Vector3<f64>,
    pub eye: Point3<f64>,
    pub center: Point3<f64>,
    pub up: Vector3<f64>,
    pub background: Bgra,

    /// Models drawn after `model_path`, in order.
    pub extra_models: Vec<PathBuf>,
    pub output: PathBuf,
    pub create_placeholders: bool,
}

impl SceneConfig {
    /// Acquires a configuration from program arguments (without the program
    /// name), applying the `-config` overlay file if one is named.
    pub fn from_args<I, S>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = ParameterTable::from_args(args);
        table.log_dump();

        if let Some([path]) = table.get("config") {
            let overlay = FileConfig::load(path)?;
            overlay.fill_missing(&mut table);
        }

        Self::from_table(&table)
    }

    /// Validates a parameter table.
    ///
    /// Every required group must be present with its exact arity, and
    /// optional groups that are present must have theirs. All problems are
    /// reported together.
    pub fn from_table(table: &ParameterTable) -> Result<Self, ConfigError> {
        let problems: Vec<GroupProblem> = GROUPS
            .iter()
            .filter_map(|rule| {
                let found = table.get(rule.name).map(<[String]>::len);
                let arity_ok = match (rule.arity, found) {
                    (_, None) => !rule.required,
                    (None, Some(_)) => true,
                    (Some(expected), Some(n)) => expected == n,
                };
                (!arity_ok).then_some(GroupProblem {
                    name: rule.name,
                    expected: rule.arity,
                    found,
                })
            })
            .collect();

        if !problems.is_empty() {
            return Err(ConfigError::InvalidGroups(problems));
        }

        // Presence and arity are checked above, so every lookup below succeeds.
        let values = |name: &str| table.get(name).unwrap_or_default();

        let config = Self {
            model_path: PathBuf::from(&values("obj")[0]),
            width: parse_dimension("width", &values("width")[0]),
            height: parse_dimension("height", &values("height")[0]),
            light_dir: parse_vec3("light_dir", values("light_dir")),
            eye: Point3::from(parse_vec3("eye", values("eye"))),
            center: Point3::from(parse_vec3("center", values("center"))),
            up: parse_vec3("up", values("up")),
            background: parse_bgra(values("new_bgra")),
            extra_models: values("models").iter().map(PathBuf::from).collect(),
            output: values("output")
                .first()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            create_placeholders: table.contains("placeholders"),
        };

        info!("{}", config.summary());
        Ok(config)
    }

    /// Every model to draw, `-obj` first.
    pub fn model_paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.model_path.as_path())
            .chain(self.extra_models.iter().map(PathBuf::as_path))
    }

    pub fn summary(&self) -> String {
        format!(
            "obj = {:?}, size = {}x{}, light_dir = {:?}, eye = {:?}, center = {:?}, up = {:?}, \
             bgra = {:?}",
            self.model_path,
            self.width,
            self.height,
            self.light_dir.as_slice(),
            self.eye.coords.as_slice(),
            self.center.coords.as_slice(),
            self.up.as_slice(),
            self.background.0,
        )
    }
}

/// Parses the leading number of `token`, like C's `strtod`/`strtol`.
///
/// Leading whitespace is skipped and trailing text is dropped with a warning.
/// Returns `None`, after a warning, when no number starts the token.
fn parse_prefix<T: FromStr>(group: &str, token: &str, prefix: fn(&str) -> &str) -> Option<T> {
    let trimmed = token.trim_start();
    let head = prefix(trimmed);
    let Ok(value) = head.parse::<T>() else {
        warn!("-{}: '{}' is not a number, using 0", group, token);
        return None;
    };
    if head.len() < trimmed.len() {
        warn!(
            "-{}: ignoring '{}' after {} in '{}'",
            group,
            &trimmed[head.len()..],
            head,
            token
        );
    }
    Some(value)
}

fn sign_len(bytes: &[u8]) -> usize {
    usize::from(matches!(bytes.first(), Some(b'+' | b'-')))
}

fn digits_len(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Longest leading `[+-]digits`, or "" when there are no digits.
fn integer_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let sign = sign_len(bytes);
    match digits_len(&bytes[sign..]) {
        0 => "",
        n => &s[..sign + n],
    }
}

/// Longest leading decimal float with optional fraction and exponent.
fn float_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = sign_len(bytes);

    let int_digits = digits_len(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_len(&bytes[end + 1..]);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exp_start = end + 1 + sign_len(&bytes[end + 1..]);
        let exp_digits = digits_len(&bytes[exp_start..]);
        if exp_digits > 0 {
            end = exp_start + exp_digits;
        }
    }
    &s[..end]
}

/// Parses a float, falling back to 0.
fn parse_f64(group: &str, token: &str) -> f64 {
    parse_prefix(group, token, float_prefix).unwrap_or(0.0)
}

fn parse_vec3(group: &str, tokens: &[String]) -> Vector3<f64> {
    Vector3::new(
        parse_f64(group, &tokens[0]),
        parse_f64(group, &tokens[1]),
        parse_f64(group, &tokens[2]),
    )
}

/// Parses a pixel count, falling back to 0 with a warning.
fn parse_dimension(group: &str, token: &str) -> u32 {
    match parse_prefix::<i64>(group, token, integer_prefix) {
        Some(n) if n >= 0 => u32::try_from(n).unwrap_or_else(|_| {
            warn!("-{}: {} is too large, using 0", group, n);
            0
        }),
        Some(n) => {
            warn!("-{}: {} is negative, using 0", group, n);
            0
        }
        None => 0,
    }
}

/// Parses four channels in blue, green, red, alpha order.
fn parse_bgra(tokens: &[String]) -> Bgra {
    let mut channels = [0u8; 4];
    for (channel, token) in channels.iter_mut().zip(tokens) {
        let value = parse_f64("new_bgra", token);
        if !(0.0..=255.0).contains(&value) {
            warn!("-new_bgra: {} is outside 0-255, clamping", value);
        }
        *channel = value.clamp(0.0, 255.0) as u8;
    }
    Bgra(channels)
}

/// The menu printed when the arguments are incomplete.
pub fn usage() -> String {
    let mut text = String::from("Input the params :\n");
    for rule in GROUPS.iter() {
        let arity = rule
            .arity
            .map_or_else(|| "*".to_string(), |n| n.to_string());
        let tag = if rule.required { "" } else { " (optional)" };
        let _ = writeln!(text, "\t-{} {}\t{}{}", rule.name, arity, rule.help, tag);
    }
    text
}

/// Scene groups read from a TOML file.
///
/// Values only fill groups the command line left out.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub obj: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub light_dir: Option<[f64; 3]>,
    pub eye: Option<[f64; 3]>,
    pub center: Option<[f64; 3]>,
    pub up: Option<[f64; 3]>,
    pub new_bgra: Option<[u8; 4]>,
    pub models: Option<Vec<String>>,
    pub output: Option<String>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Overlay {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::OverlayParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Writes every value of this file into `table` as tokens, skipping
    /// groups the table already has.
    pub fn fill_missing(&self, table: &mut ParameterTable) {
        let mut fill = |name: &str, values: Option<Vec<String>>| {
            if let Some(values) = values
                && !table.contains(name)
            {
                table.set_group(name, values);
            }
        };

        fn tokens<T: ToString>(items: &[T]) -> Vec<String> {
            items.iter().map(ToString::to_string).collect()
        }

        fill("obj", self.obj.clone().map(|s| vec![s]));
        fill("width", self.width.map(|n| vec![n.to_string()]));
        fill("height", self.height.map(|n| vec![n.to_string()]));
        fill("light_dir", self.light_dir.as_ref().map(|v| tokens(v)));
        fill("eye", self.eye.as_ref().map(|v| tokens(v)));
        fill("center", self.center.as_ref().map(|v| tokens(v)));
        fill("up", self.up.as_ref().map(|v| tokens(v)));
        fill("new_bgra", self.new_bgra.as_ref().map(|v| tokens(v)));
        fill("models", self.models.clone());
        fill("output", self.output.clone().map(|s| vec![s]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAD: &[&str] = &[
        "-obj", "head.obj", "-width", "800", "-height", "800", "-light_dir", "1", "1", "1",
        "-eye", "0", "0", "3", "-center", "0", "0", "0", "-up", "0", "1", "0", "-new_bgra",
        "0", "0", "0", "255",
    ];

    fn without(group: &str) -> Vec<&'static str> {
        let mut out = Vec::new();
        let mut skipping = false;
        for &arg in HEAD {
            let is_group = arg[1..].chars().all(|c| c.is_ascii_alphabetic() || c == '_');
            if arg.starts_with('-') && is_group {
                skipping = &arg[1..] == group;
            }
            if !skipping {
                out.push(arg);
            }
        }
        out
    }

    #[test]
    fn complete_arguments_build_a_config() {
        let config = SceneConfig::from_args(HEAD.iter().copied()).unwrap();
        assert_eq!(config.model_path, PathBuf::from("head.obj"));
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 800);
        assert_eq!(config.light_dir, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(config.eye, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(config.center, Point3::origin());
        assert_eq!(config.up, Vector3::y());
        assert_eq!(config.background, Bgra::new(0, 0, 0, 255));
        assert_eq!(config.output, PathBuf::from(DEFAULT_OUTPUT));
        assert!(config.extra_models.is_empty());
        assert!(!config.create_placeholders);
    }

    #[test]
    fn every_required_group_is_mandatory() {
        for rule in GROUPS.iter().filter(|r| r.required) {
            let args = without(rule.name);
            let err = SceneConfig::from_args(args).unwrap_err();
            match err {
                ConfigError::InvalidGroups(problems) => {
                    assert_eq!(problems.len(), 1);
                    assert_eq!(problems[0].name, rule.name);
                    assert_eq!(problems[0].found, None);
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let mut args = HEAD.to_vec();
        args.extend(["-up", "5"]); // re-opened group now holds four values
        let err = SceneConfig::from_args(args).unwrap_err();
        let ConfigError::InvalidGroups(problems) = err else {
            panic!("expected InvalidGroups");
        };
        assert_eq!(
            problems,
            vec![GroupProblem {
                name: "up",
                expected: Some(3),
                found: Some(4),
            }]
        );
    }

    #[test]
    fn dropped_negative_decimal_breaks_arity() {
        let mut args = without("light_dir");
        args.extend(["-light_dir", "-0.5", "1", "1"]);
        assert!(SceneConfig::from_args(args).is_err());
    }

    #[test]
    fn malformed_numbers_fall_back_to_zero() {
        let args = [
            "-obj", "m.obj", "-width", "wide", "-height", "12px", "-light_dir", "1", "x", "1",
            "-eye", "0", "0", "3", "-center", "0", "0", "0", "-up", "0", "1", "0", "-new_bgra",
            "9", "oops", "300", "255",
        ];
        let config = SceneConfig::from_args(args).unwrap();
        assert_eq!(config.width, 0);
        assert_eq!(config.height, 12);
        assert_eq!(config.light_dir, Vector3::new(1.0, 0.0, 1.0));
        assert_eq!(config.background, Bgra::new(9, 0, 255, 255));
    }

    #[test]
    fn leading_number_is_kept_and_trailing_text_dropped() {
        let args = [
            "-obj", "m.obj", "-width", "800.0", "-height", "600px", "-light_dir", "1.5x",
            "-2", "2.5e1y", "-eye", " 0", "0", "3", "-center", "0", "0", "0", "-up", "0",
            "1", "0", "-new_bgra", "1.9", "2", "3", "255",
        ];
        let config = SceneConfig::from_args(args).unwrap();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert_eq!(config.light_dir, Vector3::new(1.5, -2.0, 25.0));
        assert_eq!(config.eye, Point3::new(0.0, 0.0, 3.0));
        assert_eq!(config.background, Bgra::new(1, 2, 3, 255));
    }

    #[test]
    fn numeric_prefixes() {
        assert_eq!(integer_prefix("800.0"), "800");
        assert_eq!(integer_prefix("-12px"), "-12");
        assert_eq!(integer_prefix("px12"), "");
        assert_eq!(float_prefix("1.5x"), "1.5");
        assert_eq!(float_prefix("-.5"), "-.5");
        assert_eq!(float_prefix("5."), "5.");
        assert_eq!(float_prefix("2e3"), "2e3");
        assert_eq!(float_prefix("2e+"), "2");
        assert_eq!(float_prefix("."), "");
        assert_eq!(float_prefix("-x"), "");
    }

    #[test]
    fn negative_dimension_becomes_zero() {
        let mut args = without("width");
        args.extend(["-width", "-800"]);
        assert_eq!(SceneConfig::from_args(args).unwrap().width, 0);
    }

    #[test]
    fn optional_groups_are_read() {
        let mut args = HEAD.to_vec();
        args.extend(["-models", "a.obj", "b.obj", "-output", "out.tga", "-placeholders"]);
        let config = SceneConfig::from_args(args).unwrap();
        assert_eq!(
            config.model_paths().collect::<Vec<_>>(),
            vec![Path::new("head.obj"), Path::new("a.obj"), Path::new("b.obj")]
        );
        assert_eq!(config.output, PathBuf::from("out.tga"));
        assert!(config.create_placeholders);
    }

    #[test]
    fn optional_group_with_wrong_arity_is_rejected() {
        let mut args = HEAD.to_vec();
        args.extend(["-placeholders", "yes"]);
        assert!(SceneConfig::from_args(args).is_err());
    }

    #[test]
    fn overlay_fills_only_missing_groups() {
        let overlay = FileConfig::parse(
            Path::new("scene.toml"),
            r#"
                obj = "file.obj"
                up = [0.0, 1.0, 0.0]
                width = 64
                new_bgra = [1, 2, 3, 4]
            "#,
        )
        .unwrap();

        let mut table = ParameterTable::from_args(without("up"));
        overlay.fill_missing(&mut table);
        let config = SceneConfig::from_table(&table).unwrap();

        assert_eq!(config.up, Vector3::y());
        assert_eq!(config.model_path, PathBuf::from("head.obj"));
        assert_eq!(config.width, 800);
        assert_eq!(config.background, Bgra::new(0, 0, 0, 255));
    }

    #[test]
    fn overlay_rejects_unknown_keys() {
        let err = FileConfig::parse(Path::new("scene.toml"), "fov = 45").unwrap_err();
        assert!(matches!(err, ConfigError::OverlayParse { .. }));
    }

    #[test]
    fn usage_lists_every_group() {
        let text = usage();
        for rule in GROUPS.iter() {
            assert!(text.contains(&format!("-{} ", rule.name)));
        }
        assert!(text.contains("-light_dir 3"));
        assert!(text.contains("-new_bgra 4"));
    }
}

//! Profile parameter declaration, binding and verification.
//!
//! A profile declares its parameters once ([`declare`]). Caller input is bound
//! over the declared defaults ([`bind`]), coercing command-line strings to the
//! declared type and checking enumerated choices. [`verify`] then turns the
//! bound values into a typed [`ClusterParams`] or a [`ValidationReport`]
//! listing every problem found.
//!
//! # Failure Modes
//!
//! Binding and verification never stop at the first problem: all errors and
//! warnings are collected so the portal can show them together.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;

use crate::address::ClusterSubnet;
use crate::types::{self, Hardware, ProfileKind, UsrpLocation};

pub const MACHINE_NUM: &str = "machineNum";
pub const HARDWARE: &str = "Hardware";
pub const OS: &str = "OS";
pub const ISOLCPUS: &str = "isolcpusNumber";
pub const K8S: &str = "k8s";
pub const USRP_B210: &str = "usrpb210";

/// Image booted by the compute profile and the default for `OS`
pub const UBUNTU18_IMAGE: &str = "urn:publicid:IDN+emulab.net+image+emulab-ops:UBUNTU18-64-STD";

const IMAGE_URN_PREFIX: &str = "urn:publicid:IDN+";

// ============================================================================
// Declaration
// ============================================================================

/// Declared type of a profile parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParameterType {
    Integer,
    String,
    Boolean,
}

/// A bound or default parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl ParameterValue {
    /// Coerce a command-line string to the declared type.
    pub fn parse_as(kind: ParameterType, raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        match kind {
            ParameterType::Integer => i64::from_str(trimmed)
                .map(Self::Integer)
                .map_err(|_| format!("'{}' is not an integer", raw)),
            ParameterType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(Self::Boolean(true)),
                "false" | "no" | "0" => Ok(Self::Boolean(false)),
                _ => Err(format!("'{}' is not a boolean", raw)),
            },
            ParameterType::String => Ok(Self::String(raw.to_string())),
        }
    }

    /// Coerce a JSON value (from a parameter file) to the declared type.
    ///
    /// Strings are accepted for every type since the portal submits form
    /// values as text.
    pub fn from_json(kind: ParameterType, value: &serde_json::Value) -> Result<Self, String> {
        use serde_json::Value;
        match (kind, value) {
            (_, Value::String(s)) => Self::parse_as(kind, s),
            (ParameterType::Integer, Value::Number(n)) => n
                .as_i64()
                .map(Self::Integer)
                .ok_or_else(|| format!("{} is not an integer", n)),
            (ParameterType::Boolean, Value::Bool(b)) => Ok(Self::Boolean(*b)),
            (kind, other) => Err(format!("expected {}, got {}", kind, other)),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
        }
    }
}

/// One declared profile parameter, as the portal renders it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    #[serde(rename = "defaultValue")]
    pub default: ParameterValue,
    /// `(value, label)` pairs; empty means free-form
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub choices: Vec<(String, String)>,
    #[serde(default)]
    pub advanced: bool,
    #[serde(rename = "longDescription", skip_serializing_if = "Option::is_none", default)]
    pub long_description: Option<String>,
}

impl ParameterSpec {
    pub fn new(name: &str, label: &str, kind: ParameterType, default: ParameterValue) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            default,
            choices: Vec::new(),
            advanced: false,
            long_description: None,
        }
    }

    pub fn with_choices(mut self, choices: Vec<(String, String)>) -> Self {
        self.choices = choices;
        self
    }

    pub fn advanced(mut self) -> Self {
        self.advanced = true;
        self
    }

    pub fn with_description(mut self, text: &str) -> Self {
        self.long_description = Some(text.to_string());
        self
    }

    fn allows(&self, value: &ParameterValue) -> bool {
        if self.choices.is_empty() {
            return true;
        }
        let text = value.to_string();
        self.choices.iter().any(|(v, _)| *v == text)
    }
}

/// Declare the parameters of a profile, in portal display order
pub fn declare(profile: ProfileKind) -> Vec<ParameterSpec> {
    let hardware_choices = types::choices::<Hardware>(|h| h.to_string());
    let mut specs = vec![
        ParameterSpec::new(
            MACHINE_NUM,
            "Number of Machines",
            ParameterType::Integer,
            ParameterValue::Integer(1),
        ),
        ParameterSpec::new(
            HARDWARE,
            "Machine Hardware",
            ParameterType::String,
            ParameterValue::String(Hardware::default().to_string()),
        )
        .with_choices(hardware_choices),
    ];

    if profile == ProfileKind::Kubernetes {
        specs.extend([
            ParameterSpec::new(
                OS,
                "Disk Image",
                ParameterType::String,
                ParameterValue::String(UBUNTU18_IMAGE.to_string()),
            )
            .with_description("URN of the disk image booted on every node."),
            ParameterSpec::new(
                ISOLCPUS,
                "Number of Isolated CPUs",
                ParameterType::Integer,
                ParameterValue::Integer(0),
            )
            .advanced()
            .with_description(
                "Cores reserved from the scheduler on each worker. 0 leaves all cores shared and skips the reboot.",
            ),
            ParameterSpec::new(
                K8S,
                "Kubernetes",
                ParameterType::Boolean,
                ParameterValue::Boolean(false),
            )
            .with_description("Add a control-plane node and join every worker to its cluster."),
            ParameterSpec::new(
                USRP_B210,
                "USRP B210",
                ParameterType::String,
                ParameterValue::String(UsrpLocation::None.to_string()),
            )
            .with_choices(types::choices::<UsrpLocation>(UsrpLocation::label)),
        ]);
    }

    specs
}

// ============================================================================
// Validation report
// ============================================================================

/// A single error or warning, tied to the parameters involved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterIssue {
    pub parameters: Vec<String>,
    pub message: String,
}

impl ParameterIssue {
    pub fn new<I, S>(parameters: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ParameterIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parameters.join(", "), self.message)
    }
}

/// Machine-readable result of binding and verification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ParameterIssue>,
    pub warnings: Vec<ParameterIssue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Move every warning into the error list
    pub fn promote_warnings(mut self) -> Self {
        self.errors.append(&mut self.warnings);
        self
    }

    fn into_result<T>(self, value: T) -> Result<T, ValidationReport> {
        if self.has_errors() { Err(self) } else { Ok(value) }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let issues: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", issues.join("; "))
    }
}

// ============================================================================
// Binding
// ============================================================================

/// Parameter values after binding caller input over defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundParameters {
    profile: ProfileKind,
    values: BTreeMap<String, ParameterValue>,
}

impl BoundParameters {
    pub fn profile(&self) -> ProfileKind {
        self.profile
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    pub fn values(&self) -> &BTreeMap<String, ParameterValue> {
        &self.values
    }

    fn integer(&self, name: &str) -> i64 {
        self.get(name).and_then(ParameterValue::as_integer).unwrap_or_default()
    }

    fn string(&self, name: &str) -> &str {
        self.get(name).and_then(ParameterValue::as_str).unwrap_or_default()
    }

    fn boolean(&self, name: &str) -> bool {
        self.get(name).and_then(ParameterValue::as_bool).unwrap_or_default()
    }
}

/// Bind caller input to the profile's declared parameters.
///
/// Unknown names, values that do not coerce to the declared type and values
/// outside a choice list are all reported as errors.
pub fn bind(
    profile: ProfileKind,
    input: &BTreeMap<String, serde_json::Value>,
) -> Result<BoundParameters, ValidationReport> {
    let (bound, report) = bind_partial(profile, input);
    report.into_result(bound)
}

/// Bind what can be bound and report the rest.
///
/// A rejected value leaves the declared default in place, so the result can
/// still be verified and the findings merged into one report.
pub fn bind_partial(
    profile: ProfileKind,
    input: &BTreeMap<String, serde_json::Value>,
) -> (BoundParameters, ValidationReport) {
    let specs = declare(profile);
    let mut report = ValidationReport::default();
    let mut values: BTreeMap<String, ParameterValue> = specs
        .iter()
        .map(|spec| (spec.name.clone(), spec.default.clone()))
        .collect();

    for (name, raw) in input {
        let Some(spec) = specs.iter().find(|s| s.name == *name) else {
            report.errors.push(ParameterIssue::new(
                [name.as_str()],
                format!("no such parameter in the {} profile", profile),
            ));
            continue;
        };

        match ParameterValue::from_json(spec.kind, raw) {
            Ok(value) if spec.allows(&value) => {
                debug!("Bound {} = {}", name, value);
                values.insert(name.clone(), value);
            }
            Ok(value) => {
                let allowed: Vec<&str> = spec.choices.iter().map(|(v, _)| v.as_str()).collect();
                report.errors.push(ParameterIssue::new(
                    [name.as_str()],
                    format!("'{}' is not one of: {}", value, allowed.join(", ")),
                ));
            }
            Err(msg) => report.errors.push(ParameterIssue::new([name.as_str()], msg)),
        }
    }

    (BoundParameters { profile, values }, report)
}

// ============================================================================
// Verification
// ============================================================================

/// Verified, typed profile parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterParams {
    pub profile: ProfileKind,
    pub machine_num: u32,
    pub hardware: Hardware,
    pub os: String,
    pub isolcpus: u32,
    pub k8s: bool,
    pub usrp: UsrpLocation,
}

impl ClusterParams {
    /// Host numbers reserved ahead of the workers
    pub fn control_plane_offset(&self) -> u32 {
        u32::from(self.k8s)
    }
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            profile: ProfileKind::Compute,
            machine_num: 1,
            hardware: Hardware::default(),
            os: UBUNTU18_IMAGE.to_string(),
            isolcpus: 0,
            k8s: false,
            usrp: UsrpLocation::None,
        }
    }
}

/// Outcome of a successful verification
#[derive(Debug, Clone)]
pub struct VerifiedParameters {
    pub params: ClusterParams,
    pub bound: BoundParameters,
    pub warnings: Vec<ParameterIssue>,
}

/// Check bound values and convert them to [`ClusterParams`].
pub fn verify(bound: BoundParameters) -> Result<VerifiedParameters, ValidationReport> {
    verify_into(bound, ValidationReport::default())
}

fn verify_into(
    bound: BoundParameters,
    mut report: ValidationReport,
) -> Result<VerifiedParameters, ValidationReport> {
    let profile = bound.profile();

    let k8s = bound.boolean(K8S);
    let offset = u32::from(k8s);
    let max_workers = ClusterSubnet::default().capacity().saturating_sub(offset);

    let machine_num = bound.integer(MACHINE_NUM);
    let machine_num = match u32::try_from(machine_num) {
        Err(_) if machine_num < 0 => {
            report
                .errors
                .push(ParameterIssue::new([MACHINE_NUM], "must not be negative"));
            0
        }
        Ok(n) if n <= max_workers => n,
        _ => {
            let involved: Vec<&str> = if k8s { vec![MACHINE_NUM, K8S] } else { vec![MACHINE_NUM] };
            report.errors.push(ParameterIssue::new(
                involved,
                format!(
                    "at most {} machines fit in the cluster subnet, {} requested",
                    max_workers, machine_num
                ),
            ));
            0
        }
    };

    let isolcpus = bound.integer(ISOLCPUS);
    let isolcpus = u32::try_from(isolcpus).unwrap_or_else(|_| {
        report
            .errors
            .push(ParameterIssue::new([ISOLCPUS], "must be a non-negative core count"));
        0
    });

    // Choices were checked while binding
    let hardware = Hardware::from_str(bound.string(HARDWARE)).unwrap_or_default();
    let usrp = UsrpLocation::from_str(bound.string(USRP_B210)).unwrap_or_default();

    let os = match profile {
        ProfileKind::Compute => UBUNTU18_IMAGE.to_string(),
        ProfileKind::Kubernetes => bound.string(OS).trim().to_string(),
    };
    if os.is_empty() {
        report
            .errors
            .push(ParameterIssue::new([OS], "a disk image must be specified"));
    } else if !os.starts_with(IMAGE_URN_PREFIX) {
        report.warnings.push(ParameterIssue::new(
            [OS],
            format!("'{}' does not look like an image URN", os),
        ));
    }

    if machine_num == 0 && !report.has_errors() {
        let message = if k8s {
            "the control-plane node will have no workers"
        } else {
            "the request contains no cluster nodes"
        };
        report.warnings.push(ParameterIssue::new([MACHINE_NUM], message));
    }

    let params = ClusterParams {
        profile,
        machine_num,
        hardware,
        os,
        isolcpus,
        k8s,
        usrp,
    };
    let warnings = report.warnings.clone();
    report.into_result(VerifiedParameters {
        params,
        bound,
        warnings,
    })
}

/// Bind and verify in one step, reporting binding and range problems together
pub fn evaluate(
    profile: ProfileKind,
    input: &BTreeMap<String, serde_json::Value>,
) -> Result<VerifiedParameters, ValidationReport> {
    let (bound, report) = bind_partial(profile, input);
    verify_into(bound, report)
}

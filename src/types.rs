//! Type-safe parameter domains for the cluster profiles
//!
//! Each enumerated parameter is a Rust enum so choice lists, parsing and
//! display all come from one place.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Which profile script is being evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    /// Plain compute cluster: node count and hardware only
    #[default]
    Compute,
    /// Compute cluster with OS choice, CPU isolation, Kubernetes and USRP options
    Kubernetes,
}

impl ProfileKind {
    /// Whether worker nodes get startup commands in this profile
    pub fn runs_startup_scripts(&self) -> bool {
        matches!(self, Self::Kubernetes)
    }
}

/// Emulab node hardware classes offered by the profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Hardware {
    #[default]
    D430,
    D710,
    D820,
    Pc3000,
}

/// POWDER fixed-endpoint locations that host a USRP B210
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UsrpLocation {
    #[default]
    None,
    Bookstore,
    Cpg,
    Ebc,
    Guesthouse,
    Humanities,
    Law73,
    Madsen,
    Moran,
    Sagepoint,
    Web,
}

impl UsrpLocation {
    /// Aggregate that owns the endpoint, `None` for the sentinel
    pub fn authority(&self) -> Option<String> {
        match self {
            Self::None => None,
            location => Some(format!(
                "urn:publicid:IDN+{}.powderwireless.net+authority+cm",
                location
            )),
        }
    }

    /// Human-readable label shown in the portal form
    pub fn label(&self) -> String {
        match self {
            Self::None => "No USRP".to_string(),
            Self::Law73 => "Law 73".to_string(),
            location => {
                let name = location.to_string();
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => name,
                }
            }
        }
    }
}

/// `(value, label)` pairs for an enumerated parameter
pub fn choices<T: IntoEnumIterator + ToString>(
    label: impl Fn(&T) -> String,
) -> Vec<(String, String)> {
    T::iter().map(|v| (v.to_string(), label(&v))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_hardware_strings() {
        assert_eq!(Hardware::D430.to_string(), "d430");
        assert_eq!(Hardware::Pc3000.to_string(), "pc3000");
        assert_eq!(Hardware::from_str("d820").unwrap(), Hardware::D820);
        assert!(Hardware::from_str("c220g5").is_err());
    }

    #[test]
    fn test_usrp_authority() {
        assert_eq!(UsrpLocation::None.authority(), None);
        assert_eq!(
            UsrpLocation::Law73.authority().as_deref(),
            Some("urn:publicid:IDN+law73.powderwireless.net+authority+cm")
        );
    }

    #[test]
    fn test_usrp_labels() {
        assert_eq!(UsrpLocation::Bookstore.label(), "Bookstore");
        assert_eq!(UsrpLocation::Law73.label(), "Law 73");
        assert_eq!(UsrpLocation::None.label(), "No USRP");
    }

    #[test]
    fn test_choices_cover_all_variants() {
        let hw = choices::<Hardware>(|h| h.to_string());
        assert_eq!(hw.len(), 4);
        assert_eq!(hw[0], ("d430".to_string(), "d430".to_string()));

        let usrp = choices::<UsrpLocation>(UsrpLocation::label);
        assert_eq!(usrp[0].0, "none");
    }

    #[test]
    fn test_profile_kind() {
        assert_eq!(ProfileKind::default(), ProfileKind::Compute);
        assert!(!ProfileKind::Compute.runs_startup_scripts());
        assert!(ProfileKind::Kubernetes.runs_startup_scripts());
        assert_eq!(ProfileKind::from_str("kubernetes").unwrap(), ProfileKind::Kubernetes);
    }
}

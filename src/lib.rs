//! clusterspec library
//!
//! Parameterized CloudLab cluster profiles: declare and verify profile
//! parameters, build the node/link graph, and serialize it as a GENI
//! request RSpec.

pub mod address;
pub mod builder;
pub mod cli;
pub mod config_file;
pub mod directives;
pub mod error;
pub mod params;
pub mod rspec;
pub mod script_traits;
pub mod scripts;
pub mod types;

// Re-export main types for convenience
pub use builder::build_request;
pub use config_file::ParamsFile;
pub use directives::{CpuDirective, WorkerDirectives};
pub use error::{ProfileError, Result};
pub use params::{
    bind, bind_partial, declare, evaluate, verify, BoundParameters, ClusterParams, ParameterIssue,
    ParameterSpec, ParameterType, ParameterValue, ValidationReport, VerifiedParameters,
};
pub use rspec::{Link, Node, Request};
pub use script_traits::{DirectiveScript, StartupScript};
pub use types::{Hardware, ProfileKind, UsrpLocation};

/// Build and serialize the request for verified parameters
pub fn render(params: &ClusterParams) -> Result<String> {
    rspec::xml::to_xml(&build_request(params)?)
}

//! Content-addressed execution of EDA tool flows.
//!
//! A flow wraps one external tool chain. Its effective settings and design
//! sources are fingerprinted, the fingerprint picks the run directory, and a
//! run whose results already exist under that directory is reused unless
//! forced.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod context;
pub mod error;
pub mod flow;
pub mod flow_gen;
pub mod flow_runner;
pub mod flows;
pub mod logging;
pub mod process;
pub mod project;
pub mod registry;
pub mod report;
pub mod results;
pub mod run_dir;
pub mod tools;
pub mod util;

pub use context::{CancelFlag, ExecOptions, ExecutionContext};
pub use error::{CancelReason, FlowError};
pub use flow::{CompletedFlow, FlowInstance, FlowRun, FlowState};
pub use flow_gen::FlowGraph;
pub use flow_runner::FlowRunner;
pub use registry::{Capabilities, FlowBody, FlowRegistry, FlowType};

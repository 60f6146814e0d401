use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::{SIGINT, SIGTERM};

/// Console and re-run policy for one invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub quiet: bool,
    pub verbose: bool,
    pub force: bool,
    pub force_run_dir: Option<PathBuf>,
}

/// Shared flag flipped by an operator interrupt. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes SIGINT/SIGTERM into this flag. A second SIGINT while the flag
    /// is already set exits immediately with status 130.
    pub fn install_signal_handlers(&self) -> std::io::Result<()> {
        signal_hook::flag::register_conditional_shutdown(SIGINT, 130, Arc::clone(&self.0))?;
        signal_hook::flag::register(SIGINT, Arc::clone(&self.0))?;
        signal_hook::flag::register(SIGTERM, Arc::clone(&self.0))?;
        Ok(())
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a flow needs from its surroundings, passed explicitly instead of
/// living in process-wide state.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Root under which `.run/`, `Results/` and `Logs/` live.
    pub run_root: PathBuf,
    /// Base for relative design source paths (the project file's directory).
    pub design_root: PathBuf,
    pub options: ExecOptions,
    /// Tool name -> pinned executable, from the user config.
    pub tools: HashMap<String, PathBuf>,
    pub cancel: CancelFlag,
}

impl ExecutionContext {
    pub fn new(run_root: impl Into<PathBuf>, design_root: impl Into<PathBuf>) -> Self {
        Self {
            run_root: run_root.into(),
            design_root: design_root.into(),
            options: ExecOptions::default(),
            tools: HashMap::new(),
            cancel: CancelFlag::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: HashMap<String, PathBuf>) -> Self {
        self.tools = tools;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_cancel_flag() {
        let flag = CancelFlag::new();
        let observer = flag.clone();
        assert!(!observer.is_cancelled());
        flag.cancel();
        assert!(observer.is_cancelled());
    }
}

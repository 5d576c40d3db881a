//! Scripted [`CommandRunner`] for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::command::{CapturedOutput, CommandError, CommandRunner, CommandSpec};

type Script = Box<dyn Fn(&CommandSpec) -> Result<CapturedOutput, CommandError>>;

/// A runner that replays scripted responses in order and records every
/// invocation it receives. Panics when a command arrives with no script
/// left, so tests fail loudly on unexpected invocations.
#[derive(Default)]
pub struct FakeRunner {
    scripts: RefCell<VecDeque<Script>>,
    calls: RefCell<Vec<CommandSpec>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a handler for the next invocation. Handlers may inspect the
    /// spec and perform side effects (e.g. writing an output file a real
    /// tool would have produced).
    pub fn expect(
        &self,
        script: impl Fn(&CommandSpec) -> Result<CapturedOutput, CommandError> + 'static,
    ) {
        self.scripts.borrow_mut().push_back(Box::new(script));
    }

    /// Every invocation seen so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CapturedOutput, CommandError> {
        self.calls.borrow_mut().push(spec.clone());
        let script = self
            .scripts
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected command: `{}`", spec.program));
        script(spec)
    }
}

/// Build a [`CapturedOutput`] from text streams.
pub fn output(exit_code: i32, stdout: &str, stderr: &str) -> CapturedOutput {
    CapturedOutput {
        exit_code,
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}
